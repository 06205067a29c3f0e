use serde::Serialize;

/// Status of a cache-backed read, as seen by a UI observer.
///
/// `Loading` and `Error` may carry stale cached data so the screen can stay
/// populated while a refresh is in flight or after it failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Resource<T> {
    Loading { data: Option<T> },
    Success { data: T },
    Error { message: String, data: Option<T> },
}

impl<T> Resource<T> {
    pub fn loading(data: Option<T>) -> Self {
        Resource::Loading { data }
    }

    pub fn success(data: T) -> Self {
        Resource::Success { data }
    }

    pub fn error(message: impl Into<String>, data: Option<T>) -> Self {
        Resource::Error {
            message: message.into(),
            data,
        }
    }

    /// The carried data, whichever the state.
    pub fn data(&self) -> Option<&T> {
        match self {
            Resource::Loading { data } | Resource::Error { data, .. } => data.as_ref(),
            Resource::Success { data } => Some(data),
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            Resource::Loading { data } | Resource::Error { data, .. } => data,
            Resource::Success { data } => Some(data),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Resource::Loading { .. })
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Resource::Error { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Transform the carried data, keeping the state.
    pub fn map<U, F>(self, f: F) -> Resource<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Resource::Loading { data } => Resource::Loading { data: data.map(f) },
            Resource::Success { data } => Resource::Success { data: f(data) },
            Resource::Error { message, data } => Resource::Error {
                message,
                data: data.map(f),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_accessors() {
        assert_eq!(Resource::<i32>::loading(None).data(), None);
        assert_eq!(Resource::loading(Some(1)).data(), Some(&1));
        assert_eq!(Resource::success(2).into_data(), Some(2));
        assert_eq!(Resource::error("offline", Some(3)).into_data(), Some(3));
    }

    #[test]
    fn test_map_keeps_state() {
        let mapped = Resource::error("offline", Some(vec![1, 2])).map(|v| v.len());
        assert_eq!(mapped, Resource::error("offline", Some(2)));
        assert_eq!(mapped.error_message(), Some("offline"));
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(Resource::error("timeout", Some(5))).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "error", "message": "timeout", "data": 5})
        );

        let json = serde_json::to_value(Resource::<i32>::loading(None)).unwrap();
        assert_eq!(json, serde_json::json!({"status": "loading", "data": null}));
    }
}
