//! Display mapping shared by every renderer
//!
//! Pure functions from client state to the pieces a view needs. Styling is
//! left to the host; this module only decides which characters go where.

use crate::payload::fractional_len;

/// π split into its separately-styled parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PiDisplay {
    /// Integer part with the decimal point, e.g. `3.`
    pub integer: String,
    /// Fractional digits actually received
    pub computed: String,
    /// Zeros standing in for digits not yet computed
    pub padding: String,
}

impl PiDisplay {
    /// Total fractional characters shown (computed plus padding)
    pub fn width(&self) -> usize {
        self.computed.chars().count() + self.padding.len()
    }
}

/// Split a π string for display against the target precision
pub fn split_pi(pi: &str, target_precision: usize) -> PiDisplay {
    let (integer, fraction) = pi.split_once('.').unwrap_or((pi, ""));
    let computed = fraction.to_string();
    let padding = "0".repeat(target_precision.saturating_sub(fractional_len(pi)));

    PiDisplay {
        integer: format!("{}.", integer),
        computed,
        padding,
    }
}

/// Add thousands separators to the integer portion of a decimal string
///
/// The fractional portion is never altered. Empty strings, scientific
/// notation, and anything that is not a plain decimal pass through verbatim.
pub fn format_circumference(value: &str) -> String {
    if value.is_empty() || value.contains(['e', 'E']) {
        return value.to_string();
    }

    let (sign, unsigned) = match value.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", value.strip_prefix('+').unwrap_or(value)),
    };
    let (integer, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));

    if integer.is_empty() || !integer.bytes().all(|b| b.is_ascii_digit()) {
        return value.to_string();
    }

    let grouped = group_thousands(integer);
    if fraction.is_empty() {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{}", sign, grouped, fraction)
    }
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Progress label such as `42 / 100`
pub fn progress_label(precision: usize, target_precision: usize) -> String {
    format!("{} / {}", precision, target_precision)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_pi_scenario() {
        let parts = split_pi("3.14159", 100);
        assert_eq!(parts.integer, "3.");
        assert_eq!(parts.computed, "14159");
        assert_eq!(parts.padding.len(), 95);
        assert!(parts.padding.chars().all(|c| c == '0'));
        assert_eq!(parts.width(), 100);
    }

    #[test]
    fn test_split_pi_initial() {
        let parts = split_pi("3", 100);
        assert_eq!(parts.integer, "3.");
        assert_eq!(parts.computed, "");
        assert_eq!(parts.padding.len(), 100);
    }

    #[test]
    fn test_split_pi_at_and_past_target() {
        let full = format!("3.{}", "9".repeat(100));
        assert!(split_pi(&full, 100).padding.is_empty());

        let over = format!("3.{}", "9".repeat(105));
        let parts = split_pi(&over, 100);
        assert_eq!(parts.computed.len(), 105);
        assert!(parts.padding.is_empty());
    }

    #[test]
    fn test_format_circumference_groups_integer_only() {
        assert_eq!(
            format_circumference("4368539720.1234"),
            "4,368,539,720.1234"
        );
        assert_eq!(format_circumference("12345.6"), "12,345.6");
        assert_eq!(format_circumference("999"), "999");
        assert_eq!(format_circumference("1000"), "1,000");
        assert_eq!(format_circumference("0"), "0");
    }

    #[test]
    fn test_format_circumference_leaves_long_fraction_alone() {
        assert_eq!(
            format_circumference("4375166.12345678901234567890"),
            "4,375,166.12345678901234567890"
        );
    }

    #[test]
    fn test_format_circumference_passthrough() {
        assert_eq!(format_circumference("4.3685e9"), "4.3685e9");
        assert_eq!(format_circumference("4.3685E+9"), "4.3685E+9");
        assert_eq!(format_circumference(""), "");
        assert_eq!(format_circumference("NaN"), "NaN");
    }

    #[test]
    fn test_format_circumference_sign() {
        assert_eq!(format_circumference("-1234567.5"), "-1,234,567.5");
        assert_eq!(format_circumference("+1234"), "1,234");
    }

    #[test]
    fn test_format_circumference_trailing_point() {
        assert_eq!(format_circumference("1234."), "1,234");
    }

    #[test]
    fn test_progress_label() {
        assert_eq!(progress_label(5, 100), "5 / 100");
    }
}
