use super::Pushback;

/// What one call of the perform function produced: the transport result plus
/// any pushback the server attached, on success or failure alike.
#[derive(Debug)]
pub struct Outcome<R, E> {
    pub result: Result<R, E>,
    pub pushback: Option<Pushback>,
}

impl<R, E> Outcome<R, E> {
    pub fn ok(response: R) -> Self {
        Self {
            result: Ok(response),
            pushback: None,
        }
    }

    pub fn err(error: E) -> Self {
        Self {
            result: Err(error),
            pushback: None,
        }
    }

    pub fn with_pushback(mut self, pushback: Pushback) -> Self {
        self.pushback = Some(pushback);
        self
    }

    /// Attach a pushback read from optional response metadata.
    pub fn with_pushback_opt(mut self, pushback: Option<Pushback>) -> Self {
        self.pushback = pushback;
        self
    }
}

impl<R, E> From<Result<R, E>> for Outcome<R, E> {
    fn from(result: Result<R, E>) -> Self {
        Self {
            result,
            pushback: None,
        }
    }
}
