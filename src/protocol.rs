use crate::types::RegMode;

pub const SUPER_PATH: &str = "/super.cgi";
pub const ACCUEIL_PATH: &str = "/accueil.cgi";
pub const REG_GET_PATH: &str = "/getReg.cgi";
pub const REG_SET_PATH: &str = "/setReg.cgi";
pub const TOGGLE_POWER_PATH: &str = "/changeOnOff.cgi";
pub const LIGHT_PATH: &str = "/toggleE.cgi";

/// Request body as the transport sends it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Body {
    Empty,
    Form(Vec<(String, String)>),
    /// Sent verbatim as `text/plain`.
    Raw(String),
}

pub fn set_mode_form(mode: RegMode) -> Vec<(String, String)> {
    vec![("mode".to_string(), mode.as_device_str().to_string())]
}

/// The firmware wants all three regulation targets written together.
pub fn set_setpoint_form(temp: f64) -> Vec<(String, String)> {
    let t = format!("{temp:.1}");
    vec![
        ("consigneFroid".to_string(), t.clone()),
        ("consigneChaud".to_string(), t.clone()),
        ("consigneAuto".to_string(), t),
    ]
}

pub fn light_body(on: bool) -> &'static str {
    if on { "1" } else { "0" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setpoint_written_to_all_three_fields() {
        let form = set_setpoint_form(28.25);
        assert_eq!(form.len(), 3);
        assert!(form.iter().all(|(_, v)| v == "28.2" || v == "28.3"));
        let names: Vec<_> = form.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, ["consigneFroid", "consigneChaud", "consigneAuto"]);
    }

    #[test]
    fn setpoint_one_decimal() {
        assert_eq!(set_setpoint_form(30.0)[0].1, "30.0");
        assert_eq!(set_setpoint_form(27.46)[1].1, "27.5");
    }

    #[test]
    fn mode_form_uses_device_names() {
        assert_eq!(
            set_mode_form(RegMode::Froid),
            vec![("mode".to_string(), "FROID".to_string())]
        );
    }

    #[test]
    fn light_payload() {
        assert_eq!(light_body(true), "1");
        assert_eq!(light_body(false), "0");
    }
}
