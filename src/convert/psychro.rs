/// Saturation pressure of water vapour in kPa, per the ASHRAE Handbook
/// of Fundamentals "Psychrometrics" correlations.
///
/// Two polynomial branches: saturation over liquid water at and above
/// 0 °C, sublimation over ice below. The branches agree to well under a
/// pascal at the boundary.
pub fn psat_water_vapour(temp: f64) -> f64 {
    let temp_k = temp + 273.15;
    if temp >= 0.0 {
        let n1 = 0.11670521452767e+4;
        let n2 = -0.72421316703206e+6;
        let n3 = -0.17073846940092e+2;
        let n4 = 0.12020824702470e+5;
        let n5 = -0.32325550322333e+7;
        let n6 = 0.14915108613530e+2;
        let n7 = -0.48232657361591e+4;
        let n8 = 0.40511340542057e+6;
        let n9 = -0.23855557567849e+0;
        let n10 = 0.65017534844798e+3;
        let theta = temp_k + n9 / (temp_k - n10);
        let a = theta * theta + n1 * theta + n2;
        let b = n3 * theta * theta + n4 * theta + n5;
        let c = n6 * theta * theta + n7 * theta + n8;
        1000.0 * (2.0 * c / (-b + (b * b - 4.0 * a * c).sqrt())).powi(4)
    } else {
        let a1 = -0.212144006e+2;
        let a2 = 0.273203819e+2;
        let a3 = -0.610598130e+1;
        let b1 = 0.333333333e-2;
        let b2 = 0.120666667e+1;
        let b3 = 0.170333333e+1;
        let theta = temp_k / 273.15;
        0.611657
            * ((a1 * theta.powf(b1) + a2 * theta.powf(b2) + a3 * theta.powf(b3)) / theta).exp()
    }
}

/// Relative humidity in percent, derived from dry-bulb and dew-point
/// temperatures, rounded to the nearest integer.
pub fn relative_humidity(dry_bulb: f64, dew_point: f64) -> i64 {
    let pv = psat_water_vapour(dew_point);
    let psat = psat_water_vapour(dry_bulb);
    (100.0 * pv / psat).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_saturation_pressures() {
        // 2.3388 kPa at 20 C, 0.6112 kPa at the triple point region
        assert!((psat_water_vapour(20.0) - 2.3388).abs() < 0.005);
        assert!((psat_water_vapour(0.0) - 0.6112).abs() < 0.002);
        // Over ice at -10 C: about 0.2597 kPa
        assert!((psat_water_vapour(-10.0) - 0.2597).abs() < 0.002);
    }

    #[test]
    fn test_continuity_across_branch_boundary() {
        // Within 1 Pa (0.001 kPa) across 0 C
        let below = psat_water_vapour(-0.001);
        let above = psat_water_vapour(0.001);
        assert!((below - above).abs() < 0.001, "gap {}", (below - above).abs());
    }

    #[test]
    fn test_relative_humidity_saturated_air() {
        assert_eq!(relative_humidity(15.0, 15.0), 100);
    }

    #[test]
    fn test_relative_humidity_dry_air() {
        let rh = relative_humidity(30.0, 5.0);
        assert!((20..=25).contains(&rh), "rh {}", rh);
    }
}
