use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::controller::{Notice, NoticeLevel, Notifier, TracingNotifier};
use crate::error::ListError;

/// Output a success message in the appropriate format
pub fn output_success(
    output_format: &OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(target), Some(Value::Object(extra))) = (response.as_object_mut(), data) {
                target.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(
    output_format: &OutputFormat,
    message: &str,
    error_code: Option<&str>,
    field_errors: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": false,
                "error": message
            });

            if let Some(code) = error_code {
                response["error_code"] = json!(code);
            }
            if let Some(fields) = field_errors {
                response["field_errors"] = fields;
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
            if let Some(Value::Object(fields)) = field_errors {
                for (field, msg) in fields {
                    eprintln!("  {}: {}", field, msg.as_str().unwrap_or_default());
                }
            }
        }
    }
    Ok(())
}

/// Output an empty collection in the appropriate format
pub fn output_empty_collection(
    output_format: &OutputFormat,
    collection_name: &str,
    message: &str,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({
                collection_name: []
            }))?);
        }
        OutputFormat::Text => {
            println!("{}", message);
        }
    }
    Ok(())
}

/// Numbered rows for text output, JSON array otherwise
pub fn output_rows(
    output_format: &OutputFormat,
    collection_name: &str,
    rows: Vec<(String, String)>,
    data: Value,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({
                collection_name: data
            }))?);
        }
        OutputFormat::Text => {
            for (position, (id, line)) in rows.iter().enumerate() {
                println!("{:>3}  {}  {}", position, id, line);
            }
        }
    }
    Ok(())
}

/// Prints notices as they arrive; JSON output leaves them to the log
#[derive(Debug, Clone, Copy)]
pub struct ConsoleNotifier {
    format: OutputFormat,
}

impl ConsoleNotifier {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        match (self.format, notice.level) {
            (OutputFormat::Text, NoticeLevel::Success) => println!("✓ {}", notice.message),
            (OutputFormat::Text, NoticeLevel::Error) => eprintln!("✗ {}", notice.message),
            (OutputFormat::Json, _) => TracingNotifier.notify(notice),
        }
    }
}

/// Report a controller error and convert it for the binary's exit path
pub fn report_list_error(output_format: &OutputFormat, err: ListError) -> anyhow::Error {
    let fields = err.field_errors().map(|f| json!(f));
    let message = match &err {
        ListError::Remote(db) => db.public_message().to_string(),
        other => other.to_string(),
    };
    if let Err(e) = output_error(output_format, &message, Some(err.error_code()), fields) {
        return e;
    }
    anyhow::Error::new(err)
}
