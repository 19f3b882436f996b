use colored::{Color, Colorize};
use std::hash::{DefaultHasher, Hash, Hasher};
use std::io::{self, Stdout, Write};

/// Line-oriented reporter for command results.
pub struct Logger<W: Write = Stdout> {
    output: W,
}

impl<W: Write> Logger<W> {
    pub fn new(output: W) -> Self {
        Self { output }
    }

    fn string_to_color(s: &str) -> Color {
        let colors = [
            Color::Green,
            Color::Blue,
            Color::Magenta,
            Color::Cyan,
            Color::BrightGreen,
            Color::BrightBlue,
            Color::BrightMagenta,
            Color::BrightCyan,
        ];

        let mut hasher = DefaultHasher::new();
        s.hash(&mut hasher);
        let hash = hasher.finish();

        let idx = usize::try_from(hash % colors.len() as u64).unwrap_or_default();
        colors[idx]
    }

    pub fn log(&mut self, service_name: &str, message: &str) {
        let prefix = format!("[{service_name}]").color(Self::string_to_color(service_name));
        self.write_lines(&prefix.to_string(), message);
    }

    pub fn system(&mut self, message: &str) {
        let prefix = "[system]".color(Color::Yellow);
        self.write_lines(&prefix.to_string(), message);
    }

    pub fn error(&mut self, message: &str) {
        let prefix = "[error]".color(Color::Red);
        self.write_lines(&prefix.to_string(), message);
    }

    fn write_lines(&mut self, prefix: &str, message: &str) {
        for line in message.lines() {
            let _ = writeln!(self.output, "{prefix} {line}");
        }
    }
}

impl Logger {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

#[cfg(test)]
impl Logger<std::io::Cursor<Vec<u8>>> {
    pub fn buffer() -> Self {
        Self::new(std::io::Cursor::new(Vec::new()))
    }

    pub fn contents(self) -> String {
        String::from_utf8(self.output.into_inner()).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log() {
        let mut logger = Logger::buffer();

        logger.log("test", "line1\nline2");

        let service = "[test]".color(Logger::<Stdout>::string_to_color("test"));
        let line1 = format!("{service} line1");
        let line2 = format!("{service} line2");
        assert_eq!(logger.contents(), format!("{line1}\n{line2}\n"));
    }

    #[test]
    fn test_color_is_stable_per_service() {
        assert_eq!(
            Logger::<Stdout>::string_to_color("jira"),
            Logger::<Stdout>::string_to_color("jira")
        );
    }

    #[test]
    fn test_error() {
        let mut logger = Logger::buffer();

        logger.error("boom");

        assert_eq!(logger.contents(), format!("{} boom\n", "[error]".color(Color::Red)));
    }

    #[test]
    fn test_log_stdout() {
        let _logger = Logger::stdout();
    }
}
