//! CLI output formatting
//!
//! Every command receives an [`OutputFormat`] and routes user-facing output
//! through it, so `--json` switches the whole surface to machine-readable
//! lines without touching command logic.

/// Output format selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl OutputFormat {
    pub fn is_json(self) -> bool {
        matches!(self, OutputFormat::Json)
    }

    /// Reports a completed operation
    pub fn success(self, message: &str) {
        match self {
            OutputFormat::Human => println!("\u{2713} {message}"),
            OutputFormat::Json => println!(
                "{}",
                serde_json::json!({ "success": true, "message": message })
            ),
        }
    }

    /// Reports a failure
    pub fn error(self, message: &str) {
        match self {
            OutputFormat::Human => eprintln!("\u{2717} Error: {message}"),
            OutputFormat::Json => eprintln!(
                "{}",
                serde_json::json!({ "success": false, "error": message })
            ),
        }
    }

    /// Reports a non-fatal condition
    pub fn warn(self, message: &str) {
        match self {
            OutputFormat::Human => eprintln!("\u{26a0} {message}"),
            OutputFormat::Json => eprintln!(
                "{}",
                serde_json::json!({ "level": "warning", "message": message })
            ),
        }
    }

    /// Supplementary detail line; silent in JSON mode, where commands emit a
    /// structured value instead
    pub fn info(self, message: &str) {
        if let OutputFormat::Human = self {
            println!("  {message}");
        }
    }

    /// Emits a structured value; silent in human mode
    pub fn value(self, value: &serde_json::Value) {
        if let OutputFormat::Json = self {
            println!(
                "{}",
                serde_json::to_string_pretty(value).unwrap_or_default()
            );
        }
    }
}
