use std::fmt;

/// Error string reported by the native library.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct NativeError(pub String);

impl NativeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl From<String> for NativeError {
    fn from(message: String) -> Self {
        Self(message)
    }
}

impl From<&str> for NativeError {
    fn from(message: &str) -> Self {
        Self(message.to_owned())
    }
}

/// Error flag raised by the GL state machine after a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlError {
    pub call: &'static str,
    pub code: u32,
}

impl std::error::Error for GlError {}

impl fmt::Display for GlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} raised GL error ", self.call)?;
        let name = match self.code {
            0x0500 => "GL_INVALID_ENUM",
            0x0501 => "GL_INVALID_VALUE",
            0x0502 => "GL_INVALID_OPERATION",
            0x0503 => "GL_STACK_OVERFLOW",
            0x0504 => "GL_STACK_UNDERFLOW",
            0x0505 => "GL_OUT_OF_MEMORY",
            0x0506 => "GL_INVALID_FRAMEBUFFER_OPERATION",
            _ => return write!(f, "{:#06x}", self.code),
        };
        write!(f, "{name} ({:#06x})", self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gl_error_names_known_codes() {
        let err = GlError {
            call: "glBlendFunc",
            code: 0x0500,
        };
        assert_eq!(
            err.to_string(),
            "glBlendFunc raised GL error GL_INVALID_ENUM (0x0500)"
        );
    }

    #[test]
    fn gl_error_prints_unknown_codes_in_hex() {
        let err = GlError {
            call: "glScissor",
            code: 0x9999,
        };
        assert_eq!(err.to_string(), "glScissor raised GL error 0x9999");
    }
}
