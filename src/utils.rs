/// Backslash quoting for values rendered inside quoted directives
pub(crate) trait EscapeDirective {
    fn escape_directive(&self) -> String;
}

impl EscapeDirective for str {
    fn escape_directive(&self) -> String {
        self.replace('\\', "\\\\").replace('"', "\\\"")
    }
}
