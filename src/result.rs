//! Outcome model shared by every algebra and codec.
//!
//! A decode or encode either fully succeeds, or it yields a [`PartialResult`]:
//! an optional best-effort value plus a [`Message`] explaining what went wrong.
//! Messages are rendered on first observation only, so the happy path never
//! pays for formatting diagnostics.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::error::CodecError;
use crate::ops::NodeKind;

type Render = Box<dyn FnOnce() -> String + Send>;

/// Lazily rendered, cheaply cloneable diagnostic text.
#[derive(Clone)]
pub struct Message(Arc<Lazy<String, Render>>);

impl Message {
    pub fn new<F>(render: F) -> Self
    where
        F: FnOnce() -> String + Send + 'static,
    {
        let render: Render = Box::new(render);
        Message(Arc::new(Lazy::new(render)))
    }

    pub fn from_error<E>(error: E) -> Self
    where
        E: fmt::Display + Send + 'static,
    {
        Self::new(move || error.to_string())
    }

    /// Renders the text if needed.
    pub fn text(&self) -> &str {
        Lazy::force(&*self.0).as_str()
    }

    /// Whether anyone has observed this message yet.
    pub fn is_rendered(&self) -> bool {
        Lazy::get(&*self.0).is_some()
    }

    /// `self: next`
    pub fn then(&self, next: &Message) -> Message {
        let head = self.clone();
        let tail = next.clone();
        Message::new(move || format!("{}: {}", head.text(), tail.text()))
    }

    /// `label: self`, with the label built only when rendered.
    pub fn prefixed<F>(self, label: F) -> Message
    where
        F: FnOnce() -> String + Send + 'static,
    {
        Message::new(move || format!("{}: {}", label(), self.text()))
    }

    /// Sibling messages separated by `", "`.
    pub fn join(mut parts: Vec<Message>) -> Message {
        if parts.len() == 1 {
            if let Some(single) = parts.pop() {
                return single;
            }
        }
        Message::new(move || {
            parts
                .iter()
                .map(Message::text)
                .collect::<Vec<_>>()
                .join(", ")
        })
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Message").field(&self.text()).finish()
    }
}

// ————————————————————————————————————————————————————————————————————————————
// PARTIAL RESULT
// ————————————————————————————————————————————————————————————————————————————

/// A failed outcome, possibly still carrying a usable (degraded) value.
#[derive(Debug)]
pub struct PartialResult<T> {
    value: Option<T>,
    message: Message,
}

impl<T> PartialResult<T> {
    pub fn new(value: Option<T>, message: Message) -> Self {
        Self { value, message }
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    /// Rendered message text.
    pub fn error(&self) -> &str {
        self.message.text()
    }

    pub fn into_value(self) -> Option<T> {
        self.value
    }

    pub fn into_parts(self) -> (Option<T>, Message) {
        (self.value, self.message)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> PartialResult<U> {
        PartialResult {
            value: self.value.map(f),
            message: self.message,
        }
    }

    pub fn flat_map<U>(self, f: impl FnOnce(T) -> PartialResult<U>) -> PartialResult<U> {
        match self.value {
            Some(value) => {
                let next = f(value);
                PartialResult {
                    value: next.value,
                    message: self.message.then(&next.message),
                }
            }
            None => PartialResult {
                value: None,
                message: self.message,
            },
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// CODEC RESULT
// ————————————————————————————————————————————————————————————————————————————

/// Outcome of a decode, an encode, or an algebra extractor.
#[must_use]
#[derive(Debug)]
pub enum CodecResult<T> {
    Success(T),
    Partial(PartialResult<T>),
}

impl<T> CodecResult<T> {
    pub fn success(value: T) -> Self {
        CodecResult::Success(value)
    }

    /// Failure with no usable value.
    pub fn error<F>(message: F) -> Self
    where
        F: FnOnce() -> String + Send + 'static,
    {
        CodecResult::Partial(PartialResult::new(None, Message::new(message)))
    }

    /// Failure that still produced a degraded value.
    pub fn error_with<F>(partial: T, message: F) -> Self
    where
        F: FnOnce() -> String + Send + 'static,
    {
        CodecResult::Partial(PartialResult::new(Some(partial), Message::new(message)))
    }

    pub fn fail(error: CodecError) -> Self {
        CodecResult::Partial(PartialResult::new(None, Message::from_error(error)))
    }

    pub fn mismatch(expected: NodeKind, found: NodeKind) -> Self {
        Self::fail(CodecError::ShapeMismatch { expected, found })
    }

    pub fn from_parts(value: Option<T>, message: Message) -> Self {
        CodecResult::Partial(PartialResult::new(value, message))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CodecResult::Success(_))
    }

    /// True for a success or a partial that recovered a value.
    pub fn has_value(&self) -> bool {
        match self {
            CodecResult::Success(_) => true,
            CodecResult::Partial(partial) => partial.has_value(),
        }
    }

    /// The full value, only on success.
    pub fn result(&self) -> Option<&T> {
        match self {
            CodecResult::Success(value) => Some(value),
            CodecResult::Partial(_) => None,
        }
    }

    pub fn into_result(self) -> Option<T> {
        match self {
            CodecResult::Success(value) => Some(value),
            CodecResult::Partial(_) => None,
        }
    }

    pub fn partial(&self) -> Option<&PartialResult<T>> {
        match self {
            CodecResult::Success(_) => None,
            CodecResult::Partial(partial) => Some(partial),
        }
    }

    pub fn message(&self) -> Option<&Message> {
        self.partial().map(PartialResult::message)
    }

    /// The full value if present, else the recovered one.
    pub fn value(&self) -> Option<&T> {
        match self {
            CodecResult::Success(value) => Some(value),
            CodecResult::Partial(partial) => partial.value(),
        }
    }

    pub fn result_or_partial(self) -> Option<T> {
        match self {
            CodecResult::Success(value) => Some(value),
            CodecResult::Partial(partial) => partial.into_value(),
        }
    }

    /// Like [`result_or_partial`](Self::result_or_partial) but reports the message first.
    pub fn result_or_partial_with(self, sink: impl FnOnce(&str)) -> Option<T> {
        match self {
            CodecResult::Success(value) => Some(value),
            CodecResult::Partial(partial) => {
                sink(partial.error());
                partial.into_value()
            }
        }
    }

    /// Reports any message to `sink`, then returns the value or the fatal error.
    ///
    /// A degraded value is accepted only when `allow_partial` is set.
    pub fn get_or_fail(self, allow_partial: bool, sink: impl FnOnce(&str)) -> Result<T, CodecError> {
        match self {
            CodecResult::Success(value) => Ok(value),
            CodecResult::Partial(partial) => {
                sink(partial.error());
                let (value, message) = partial.into_parts();
                match value {
                    Some(value) if allow_partial => Ok(value),
                    _ => Err(CodecError::Rejected(message.text().to_owned())),
                }
            }
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CodecResult<U> {
        match self {
            CodecResult::Success(value) => CodecResult::Success(f(value)),
            CodecResult::Partial(partial) => CodecResult::Partial(partial.map(f)),
        }
    }

    /// Chains a fallible step.
    ///
    /// A partial value still flows into `f`; whatever `f` returns stays
    /// partial and its message is appended to the earlier one.
    pub fn flat_map<U>(self, f: impl FnOnce(T) -> CodecResult<U>) -> CodecResult<U> {
        match self {
            CodecResult::Success(value) => f(value),
            CodecResult::Partial(partial) => {
                let (value, message) = partial.into_parts();
                match value {
                    Some(value) => match f(value) {
                        CodecResult::Success(next) => CodecResult::from_parts(Some(next), message),
                        CodecResult::Partial(next) => {
                            let (next, tail) = next.into_parts();
                            CodecResult::from_parts(next, message.then(&tail))
                        }
                    },
                    None => CodecResult::from_parts(None, message),
                }
            }
        }
    }

    /// Prefixes the message, if any, with a location label.
    pub fn context<F>(self, label: F) -> Self
    where
        F: FnOnce() -> String + Send + 'static,
    {
        match self {
            CodecResult::Success(value) => CodecResult::Success(value),
            CodecResult::Partial(partial) => {
                let (value, message) = partial.into_parts();
                CodecResult::from_parts(value, message.prefixed(label))
            }
        }
    }
}

impl<T> From<PartialResult<T>> for CodecResult<T> {
    fn from(partial: PartialResult<T>) -> Self {
        CodecResult::Partial(partial)
    }
}

/// Takes the value out of `result`, recording its message if it has one.
pub(crate) fn absorb<T>(result: CodecResult<T>, errors: &mut Vec<Message>) -> Option<T> {
    match result {
        CodecResult::Success(value) => Some(value),
        CodecResult::Partial(partial) => {
            let (value, message) = partial.into_parts();
            errors.push(message);
            value
        }
    }
}

/// `Success` when nothing was recorded, otherwise a partial carrying `value`.
pub(crate) fn collect_outcome<T>(value: T, errors: Vec<Message>) -> CodecResult<T> {
    if errors.is_empty() {
        CodecResult::success(value)
    } else {
        CodecResult::from_parts(Some(value), Message::join(errors))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    #[test]
    fn messages_render_only_when_observed() {
        static RENDERED: AtomicBool = AtomicBool::new(false);
        let result: CodecResult<u8> = CodecResult::error(|| {
            RENDERED.store(true, Ordering::SeqCst);
            "boom".to_owned()
        });
        let mapped = result.map(|v| v + 1);
        assert!(!RENDERED.load(Ordering::SeqCst));
        assert_eq!(mapped.message().map(Message::text), Some("boom"));
        assert!(RENDERED.load(Ordering::SeqCst));
    }

    #[test]
    fn flat_map_chains_messages_with_colon() {
        let result = CodecResult::error_with(2, || "first".to_owned())
            .flat_map(|v| CodecResult::error_with(v * 10, || "second".to_owned()));
        let partial = result.partial().unwrap();
        assert_eq!(partial.value(), Some(&20));
        assert_eq!(partial.error(), "first: second");
    }

    #[test]
    fn flat_map_keeps_degradation_after_a_clean_step() {
        let result = CodecResult::error_with(2, || "degraded".to_owned())
            .flat_map(|v| CodecResult::success(v + 1));
        assert!(!result.is_success());
        assert_eq!(result.value(), Some(&3));
        assert_eq!(result.message().unwrap().text(), "degraded");
    }

    #[test]
    fn flat_map_skips_the_step_without_a_value() {
        let mut called = false;
        let result = CodecResult::<u8>::error(|| "nothing".to_owned()).flat_map(|v| {
            called = true;
            CodecResult::success(v)
        });
        assert!(!called);
        assert!(!result.has_value());
    }

    #[test]
    fn result_or_partial_prefers_full_value() {
        assert_eq!(CodecResult::success(1).result_or_partial(), Some(1));
        assert_eq!(CodecResult::error_with(2, || "x".to_owned()).result_or_partial(), Some(2));
        assert_eq!(CodecResult::<u8>::error(|| "x".to_owned()).result_or_partial(), None);
    }

    #[test]
    fn get_or_fail_honours_allow_partial() {
        let mut seen = String::new();
        let value = CodecResult::error_with(7, || "degraded".to_owned())
            .get_or_fail(true, |m| seen = m.to_owned());
        assert_eq!(value, Ok(7));
        assert_eq!(seen, "degraded");

        let err = CodecResult::error_with(7, || "degraded".to_owned()).get_or_fail(false, |_| {});
        assert_eq!(err, Err(CodecError::Rejected("degraded".to_owned())));

        let err = CodecResult::<u8>::error(|| "gone".to_owned()).get_or_fail(true, |_| {});
        assert_eq!(err, Err(CodecError::Rejected("gone".to_owned())));
    }

    #[test]
    fn context_and_join_build_locations() {
        let joined = Message::join(vec![
            Message::new(|| "a".to_owned()).prefixed(|| "[0]".to_owned()),
            Message::new(|| "b".to_owned()).prefixed(|| "[3]".to_owned()),
        ]);
        assert_eq!(joined.text(), "[0]: a, [3]: b");

        let result = CodecResult::<u8>::mismatch(NodeKind::Number, NodeKind::String)
            .context(|| "files".to_owned());
        assert_eq!(result.message().unwrap().text(), "files: expected number, found string");
    }
}
