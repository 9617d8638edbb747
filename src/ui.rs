use colored::Colorize;

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
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

/// Print a numbered list item
pub fn item(num: usize, msg: &str) {
    println!("  {} {}", format!("{num:>2}.").blue(), msg);
}

/// Print one line of a unified diff, colored by its marker
pub fn diff_line(line: &str) {
    if line.starts_with("---") || line.starts_with("+++") {
        println!("{}", line.bold());
    } else if line.starts_with("@@") {
        println!("{}", line.cyan());
    } else if line.starts_with('+') {
        println!("{}", line.green());
    } else if line.starts_with('-') {
        println!("{}", line.red());
    } else {
        println!("{}", line.dimmed());
    }
}
