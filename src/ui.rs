use colored::{ColoredString, Colorize};
use declarative::PropertyValue;

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Render a property value; sentinels are shown dimmed
pub fn value(value: &PropertyValue) -> ColoredString {
    match value {
        PropertyValue::Concrete(scalar) => scalar.to_string().normal(),
        PropertyValue::Auto => "(auto)".dimmed(),
        PropertyValue::NotFound => "(absent)".dimmed(),
    }
}

/// Render an observed value that may not have been retrieved
pub fn actual(value: Option<&PropertyValue>) -> ColoredString {
    match value {
        Some(v) => self::value(v),
        None => "(unknown)".dimmed(),
    }
}
