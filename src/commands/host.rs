use std::io::Write;

/// The process environment a command writes to.
///
/// Commands print results to `output`, diagnostics to `error`, and report failure
/// through `exit` so tests can observe all three.
pub trait Host: Send + Sync {
    fn output(&mut self) -> impl Write;

    fn error(&mut self) -> impl Write;

    /// End the process with `code`. Test hosts only record it.
    fn exit(&mut self, code: i32);
}

/// Captures everything a command writes
#[cfg(test)]
#[derive(Debug, Default)]
pub struct TestHost {
    pub output_buf: Vec<u8>,
    pub error_buf: Vec<u8>,
    pub exit_code: Option<i32>,
}

#[cfg(test)]
impl TestHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output_text(&self) -> String {
        String::from_utf8_lossy(&self.output_buf).into_owned()
    }

    pub fn error_text(&self) -> String {
        String::from_utf8_lossy(&self.error_buf).into_owned()
    }
}

#[cfg(test)]
impl Host for TestHost {
    fn output(&mut self) -> impl Write {
        &mut self.output_buf
    }

    fn error(&mut self) -> impl Write {
        &mut self.error_buf
    }

    fn exit(&mut self, code: i32) {
        self.exit_code = Some(code);
    }
}
