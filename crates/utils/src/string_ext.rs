/// Extends string types with useful functions
pub trait StringExt {
    /// Strips one layer of matching quotes from a trimmed string
    ///
    /// Tecplot headers quote most values, e.g. `T="Blood Flow"`, but the
    /// quotes are optional and may be single or double. Unpaired or interior
    /// quotes are left alone.
    ///
    /// ```rust
    /// # use mhdtools_utils::StringExt;
    /// assert_eq!("\"Blood Flow\"".unquote(), "Blood Flow".to_string());
    /// assert_eq!("'rho'".unquote(), "rho".to_string());
    /// assert_eq!("  plain  ".unquote(), "plain".to_string());
    /// assert_eq!("\"half".unquote(), "\"half".to_string());
    /// ```
    fn unquote(&self) -> String;
}

impl<T: AsRef<str>> StringExt for T {
    fn unquote(&self) -> String {
        let trimmed = self.as_ref().trim();
        for quote in ['"', '\''] {
            if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
                return trimmed[1..trimmed.len() - 1].to_string();
            }
        }
        trimmed.to_string()
    }
}
