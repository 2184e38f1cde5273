/// Largest number of decimals tried when rendering a value into a fixed-width field.
pub const MAX_DECIMALS: usize = 3;

/// Renders `value` right-aligned into exactly `width` characters.
///
/// The value is rounded to the largest number of decimals (from [`MAX_DECIMALS`] down
/// to zero) whose rendering still fits the field. A value that does not fit even
/// without decimals, or a non-finite value, yields `None` so the caller can decide
/// how to report it instead of writing a truncated number.
///
/// # Examples
///
/// ```
/// use bfmap::core::utils::format::format_field;
///
/// assert_eq!(format_field(197.21225, 5).as_deref(), Some("197.2"));
/// assert_eq!(format_field(1.5, 5).as_deref(), Some("1.500"));
/// assert_eq!(format_field(123456.0, 5), None);
/// ```
pub fn format_field(value: f64, width: usize) -> Option<String> {
    if !value.is_finite() {
        return None;
    }
    // -0.0 would otherwise render with a sign and lose a decimal.
    let value = if value == 0.0 { 0.0 } else { value };

    (0..=MAX_DECIMALS)
        .rev()
        .map(|decimals| format!("{value:>width$.decimals$}"))
        .find(|rendered| rendered.len() <= width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_as_many_decimals_as_fit() {
        assert_eq!(format_field(197.21225, 5).as_deref(), Some("197.2"));
        assert_eq!(format_field(61.747075, 5).as_deref(), Some("61.75"));
        assert_eq!(format_field(828.368475, 5).as_deref(), Some("828.4"));
        assert_eq!(format_field(1.5, 5).as_deref(), Some("1.500"));
    }

    #[test]
    fn negative_values_account_for_the_sign() {
        assert_eq!(format_field(-12.3456, 5).as_deref(), Some("-12.3"));
        assert_eq!(format_field(-1.25, 5).as_deref(), Some("-1.25"));
    }

    #[test]
    fn large_values_drop_to_integers_before_overflowing() {
        assert_eq!(format_field(12345.0, 5).as_deref(), Some("12345"));
        assert_eq!(format_field(99999.4, 5).as_deref(), Some("99999"));
        assert_eq!(format_field(99999.5, 5), None);
        assert_eq!(format_field(123456.0, 5), None);
    }

    #[test]
    fn short_renderings_are_right_aligned() {
        assert_eq!(format_field(5.0, 6).as_deref(), Some(" 5.000"));
        assert_eq!(format_field(0.0, 5).as_deref(), Some("0.000"));
        assert_eq!(format_field(-0.0, 5).as_deref(), Some("0.000"));
    }

    #[test]
    fn rounding_that_gains_a_digit_still_fits() {
        assert_eq!(format_field(9.99996, 5).as_deref(), Some("10.00"));
    }

    #[test]
    fn non_finite_values_are_rejected() {
        assert_eq!(format_field(f64::NAN, 5), None);
        assert_eq!(format_field(f64::INFINITY, 5), None);
        assert_eq!(format_field(f64::NEG_INFINITY, 5), None);
    }
}
