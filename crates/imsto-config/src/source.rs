/// Read access to sectioned configuration.
///
/// Implementations resolve `(section, key)` with their own layering policy.
/// Storage engines and the engine registry only ever see this trait.
pub trait Config: Send + Sync {
    /// Look up `key` for `section`, returning `None` when no layer defines it.
    fn value(&self, section: &str, key: &str) -> Option<String>;

    /// Whether `section` is explicitly present in the loaded configuration.
    fn has_section(&self, section: &str) -> bool;

    /// Integer value, `0` when missing or not a number.
    fn int_value(&self, section: &str, key: &str) -> i64 {
        self.value(section, key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0)
    }

    /// Boolean value; accepts `true/false`, `yes/no`, `on/off` and `1/0`.
    fn bool_value(&self, section: &str, key: &str) -> Option<bool> {
        let v = self.value(section, key)?;
        match v.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        }
    }
}
