/// An immutable message addressed to an actor loop.
///
/// Carries the identity of its sender and a payload. Fields are private: a
/// message is built once, moved into the loop's inbound queue and consumed
/// exactly once by the actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message<P> {
    from: String,
    payload: P,
}

impl<P> Message<P> {
    pub fn new(from: impl Into<String>, payload: P) -> Self {
        Self {
            from: from.into(),
            payload,
        }
    }

    /// Identifier of the sender.
    pub fn from(&self) -> &str {
        &self.from
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn into_payload(self) -> P {
        self.payload
    }

    pub fn into_parts(self) -> (String, P) {
        (self.from, self.payload)
    }
}
