//! Managed-frame placeholders and the stack-growth arbiter.
//!
//! Whether a method needs a managed frame is only known once the body and
//! the parameter binding code have all been generated, yet the acquisition
//! and fetch-parameters calls sit at the very top of the output. Every
//! frame-dependent site is therefore emitted as a [`FrameToken`] and resolved
//! in one pass by [`StackGrowth::finalize`].

use super::EmissionBuffer;

/// Members of the terminal-return macro family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnMacro {
    /// Return with no value.
    Empty,
    Null,
    True,
    False,
    Long(String),
    Double(String),
    Bool(String),
    /// Return a copy of a string value.
    String(String),
    /// Return a copy of a boxed value.
    Ctor(String),
}

impl ReturnMacro {
    fn render(&self, grown: bool) -> String {
        let mm = if grown { "MM_" } else { "" };
        match self {
            ReturnMacro::Empty if grown => "RETURN_MM();".to_string(),
            ReturnMacro::Empty => "return;".to_string(),
            ReturnMacro::Null => format!("RETURN_{mm}NULL();"),
            ReturnMacro::True => format!("RETURN_{mm}TRUE;"),
            ReturnMacro::False => format!("RETURN_{mm}FALSE;"),
            ReturnMacro::Long(expr) => format!("RETURN_{mm}LONG({expr});"),
            ReturnMacro::Double(expr) => format!("RETURN_{mm}DOUBLE({expr});"),
            ReturnMacro::Bool(expr) => format!("RETURN_{mm}BOOL({expr});"),
            ReturnMacro::String(expr) => format!("RETURN_{mm}STR_COPY({expr});"),
            ReturnMacro::Ctor(expr) => format!("RETURN_{mm}CTOR({expr});"),
        }
    }
}

/// A frame-dependent emission site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameToken {
    /// Frame acquisition at the top of the method.
    Acquire,
    /// Frame restoration before a non-returning exit.
    Restore,
    /// A terminal return.
    Return(ReturnMacro),
    /// The fetch-parameters call; its first argument says whether a frame exists.
    FetchParams {
        required: usize,
        optional: usize,
        args: Vec<String>,
    },
}

impl FrameToken {
    /// Concrete rendering, or `None` when the site disappears.
    pub fn render(&self, grown: bool) -> Option<String> {
        match self {
            FrameToken::Acquire => grown.then(|| "ZEPHIR_MM_GROW();".to_string()),
            FrameToken::Restore => grown.then(|| "ZEPHIR_MM_RESTORE();".to_string()),
            FrameToken::Return(ret) => Some(ret.render(grown)),
            FrameToken::FetchParams {
                required,
                optional,
                args,
            } => {
                let mut call = format!(
                    "zephir_fetch_params({}, {required}, {optional}",
                    u8::from(grown)
                );
                for arg in args {
                    call.push_str(", ");
                    call.push_str(arg);
                }
                call.push_str(");");
                Some(call)
            }
        }
    }
}

/// The rendered method after the frame decision has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedBody {
    /// Whether the managed-frame rendering was chosen.
    pub grown: bool,
    pub code: String,
}

/// Tracks whether anything emitted for the current unit needs a managed frame.
///
/// Requests are a monotonic OR; nothing reads the flag until
/// [`finalize`](Self::finalize) consumes the arbiter.
#[derive(Debug, Default)]
pub struct StackGrowth {
    requested: bool,
    requests: u32,
}

impl StackGrowth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that some emitted operation needs a managed frame.
    pub fn request(&mut self) {
        self.requested = true;
        self.requests += 1;
    }

    /// How many requests were made so far.
    pub fn request_count(&self) -> u32 {
        self.requests
    }

    /// Resolve every placeholder in `buffer` against the final flag.
    pub fn finalize(self, buffer: EmissionBuffer) -> FinalizedBody {
        let grown = self.requested;
        log::debug!(
            "finalizing frame: {} ({} request(s))",
            if grown { "managed" } else { "none" },
            self.requests
        );
        FinalizedBody {
            grown,
            code: buffer.render(grown),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_and_restore_vanish_without_frame() {
        assert_eq!(FrameToken::Acquire.render(false), None);
        assert_eq!(FrameToken::Restore.render(false), None);
        assert_eq!(FrameToken::Acquire.render(true).as_deref(), Some("ZEPHIR_MM_GROW();"));
        assert_eq!(FrameToken::Restore.render(true).as_deref(), Some("ZEPHIR_MM_RESTORE();"));
    }

    #[test]
    fn return_family() {
        let cases = [
            (ReturnMacro::Empty, "RETURN_MM();", "return;"),
            (ReturnMacro::Null, "RETURN_MM_NULL();", "RETURN_NULL();"),
            (ReturnMacro::True, "RETURN_MM_TRUE;", "RETURN_TRUE;"),
            (ReturnMacro::Long("a".into()), "RETURN_MM_LONG(a);", "RETURN_LONG(a);"),
            (ReturnMacro::Ctor("&r".into()), "RETURN_MM_CTOR(&r);", "RETURN_CTOR(&r);"),
        ];
        for (ret, grown, plain) in cases {
            let token = FrameToken::Return(ret);
            assert_eq!(token.render(true).as_deref(), Some(grown));
            assert_eq!(token.render(false).as_deref(), Some(plain));
        }
    }

    #[test]
    fn fetch_params_flag() {
        let token = FrameToken::FetchParams {
            required: 1,
            optional: 1,
            args: vec!["&a_param".into(), "&b".into()],
        };
        assert_eq!(
            token.render(true).as_deref(),
            Some("zephir_fetch_params(1, 1, 1, &a_param, &b);")
        );
        assert_eq!(
            token.render(false).as_deref(),
            Some("zephir_fetch_params(0, 1, 1, &a_param, &b);")
        );
    }

    #[test]
    fn any_request_selects_managed_rendering() {
        let mut buffer = EmissionBuffer::new();
        buffer.frame(1, FrameToken::Acquire);
        buffer.code(1, "php_printf(\"hi\");");
        buffer.frame(1, FrameToken::Return(ReturnMacro::Null));

        let mut growth = StackGrowth::new();
        growth.request();
        growth.request();
        assert_eq!(growth.request_count(), 2);

        let body = growth.finalize(buffer);
        assert!(body.grown);
        assert_eq!(
            body.code,
            "\tZEPHIR_MM_GROW();\n\tphp_printf(\"hi\");\n\tRETURN_MM_NULL();\n"
        );
    }

    #[test]
    fn no_request_strips_frame_management() {
        let mut buffer = EmissionBuffer::new();
        buffer.frame(1, FrameToken::Acquire);
        buffer.code(1, "php_printf(\"hi\");");
        buffer.frame(1, FrameToken::Restore);

        let body = StackGrowth::new().finalize(buffer);
        assert!(!body.grown);
        assert_eq!(body.code, "\tphp_printf(\"hi\");\n");
    }
}
