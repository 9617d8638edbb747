//! Prompt detection and reply cleanup for interactive CLI shells.
//!
//! The SSH backend reads from a PTY until one of these prompts shows up at
//! the end of the buffer. Kept free of I/O so it can be tested directly.

/// Longest hostname-plus-mode prompt accepted.
const MAX_PROMPT_LEN: usize = 80;

/// A prompt found at the end of device output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    /// `Router>`
    UserExec(String),
    /// `Router#`, `Router(config)#`, `Router(config-line)#`
    Privileged(String),
    /// `Password:` while entering enable mode
    Password,
}

impl Prompt {
    pub fn is_privileged(&self) -> bool {
        matches!(self, Self::Privileged(_))
    }
}

/// Find a prompt on the last line of `buffer`.
pub fn find_prompt(buffer: &str) -> Option<Prompt> {
    let last = buffer.rsplit(['\n', '\r']).find(|line| !line.trim().is_empty())?;
    let last = last.trim();

    if last.ends_with("Password:") {
        return Some(Prompt::Password);
    }

    if last.len() > MAX_PROMPT_LEN || last.len() < 2 || last.contains(char::is_whitespace) {
        return None;
    }

    // The prompt must be the final thing in the buffer, not an earlier line
    // followed by blank output that is still arriving.
    if !buffer.trim_end_matches([' ', '\t']).ends_with(last) {
        return None;
    }

    if last.ends_with('#') {
        Some(Prompt::Privileged(last.to_string()))
    } else if last.ends_with('>') {
        Some(Prompt::UserExec(last.to_string()))
    } else {
        None
    }
}

/// Strip the echoed command and the trailing prompt from a reply.
pub fn clean_reply(raw: &str, command: &str) -> String {
    let normalized = raw.replace("\r\n", "\n").replace('\r', "");
    let mut lines: Vec<&str> = normalized.lines().collect();

    if let Some(first) = lines.first()
        && !command.is_empty()
        && first.trim_end().ends_with(command.trim())
    {
        lines.remove(0);
    }

    if let Some(last) = lines.last()
        && find_prompt(last).is_some()
    {
        lines.pop();
    }

    lines.join("\n")
}
