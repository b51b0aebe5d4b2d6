use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnergyUnit {
    #[serde(rename = "Wh")]
    Wh,
    #[serde(rename = "kWh")]
    KWh,
    #[serde(rename = "MWh")]
    MWh,
    #[serde(rename = "GWh")]
    GWh,
}

impl EnergyUnit {
    pub fn label(&self) -> &'static str {
        match self {
            EnergyUnit::Wh => "Wh",
            EnergyUnit::KWh => "kWh",
            EnergyUnit::MWh => "MWh",
            EnergyUnit::GWh => "GWh",
        }
    }
}

impl fmt::Display for EnergyUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An energy figure rescaled into the unit that keeps it readable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FormattedValue {
    pub unit: EnergyUnit,
    pub value: f64,
}

impl FormattedValue {
    pub fn label(&self) -> &'static str {
        self.unit.label()
    }

    pub fn as_pair(&self) -> (&'static str, f64) {
        (self.label(), self.value)
    }
}

impl fmt::Display for FormattedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} {}", self.value, self.unit)
    }
}

/// Picks Wh/kWh/MWh/GWh for a value given in kWh. Thresholds are checked in
/// ascending order and the first match wins.
pub fn adaptive_unit(value_kwh: f64) -> FormattedValue {
    let (unit, value) = if value_kwh < 1.0 {
        (EnergyUnit::Wh, value_kwh * 1000.0)
    } else if value_kwh < 1_000.0 {
        (EnergyUnit::KWh, value_kwh)
    } else if value_kwh < 1_000_000.0 {
        (EnergyUnit::MWh, value_kwh / 1000.0)
    } else {
        (EnergyUnit::GWh, value_kwh / 1_000_000.0)
    };
    FormattedValue { unit, value }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sub_kilowatt_hour_goes_to_wh() {
        let formatted = adaptive_unit(0.5);
        assert_eq!(formatted.label(), "Wh");
        assert_relative_eq!(formatted.value, 500.0);
    }

    #[test]
    fn large_values_go_to_gwh() {
        let formatted = adaptive_unit(2_500_000.0);
        assert_eq!(formatted.as_pair().0, "GWh");
        assert_relative_eq!(formatted.value, 2.5);
    }

    #[test]
    fn thresholds_are_exclusive_upper_bounds() {
        assert_eq!(adaptive_unit(0.0).unit, EnergyUnit::Wh);
        assert_eq!(adaptive_unit(0.999).unit, EnergyUnit::Wh);
        assert_eq!(adaptive_unit(1.0).unit, EnergyUnit::KWh);
        assert_eq!(adaptive_unit(999.99).unit, EnergyUnit::KWh);
        assert_eq!(adaptive_unit(1_000.0).unit, EnergyUnit::MWh);
        assert_eq!(adaptive_unit(999_999.0).unit, EnergyUnit::MWh);
        assert_eq!(adaptive_unit(1_000_000.0).unit, EnergyUnit::GWh);
    }

    #[test]
    fn kwh_values_pass_through() {
        let formatted = adaptive_unit(10.0);
        assert_eq!(formatted.as_pair(), ("kWh", 10.0));
        assert_relative_eq!(adaptive_unit(3650.0).value, 3.65);
    }

    #[test]
    fn display_uses_two_decimals() {
        assert_eq!(adaptive_unit(12.346).to_string(), "12.35 kWh");
        assert_eq!(adaptive_unit(0.25).to_string(), "250.00 Wh");
    }

    #[test]
    fn unit_serializes_as_label() {
        let json = serde_json::to_string(&adaptive_unit(5_000.0)).unwrap();
        assert_eq!(json, r#"{"unit":"MWh","value":5.0}"#);
    }
}
