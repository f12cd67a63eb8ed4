/// Replayable Request Descriptions

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::Serialize;

use crate::error::ApiError;

/// An outbound request captured in owned form so it can be dispatched a
/// second time after a token refresh.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    method: Method,
    path: String,
    headers: HeaderMap,
    body: RequestBody,
    refresh_on_unauthorized: bool,
    retried: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    /// `application/x-www-form-urlencoded`
    Form(Vec<(String, String)>),
    Multipart(Vec<MultipartField>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MultipartField {
    pub name: String,
    pub value: MultipartValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MultipartValue {
    Text(String),
    File {
        file_name: String,
        content_type: Option<String>,
        bytes: Vec<u8>,
    },
}

impl MultipartField {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: MultipartValue::Text(value.into()),
        }
    }

    pub fn file(
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: Option<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            value: MultipartValue::File {
                file_name: file_name.into(),
                content_type,
                bytes,
            },
        }
    }

    fn to_part(&self) -> Result<Part, ApiError> {
        match &self.value {
            MultipartValue::Text(text) => Ok(Part::text(text.clone())),
            MultipartValue::File {
                file_name,
                content_type,
                bytes,
            } => {
                let part = Part::bytes(bytes.clone()).file_name(file_name.clone());
                match content_type {
                    Some(mime) => part.mime_str(mime).map_err(|e| {
                        ApiError::InvalidRequest(format!("invalid content type {}: {}", mime, e))
                    }),
                    None => Ok(part),
                }
            }
        }
    }
}

impl PendingRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
            refresh_on_unauthorized: true,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidRequest(format!("body is not serializable: {}", e)))?;
        self.body = RequestBody::Json(value);
        Ok(self)
    }

    pub fn form<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.body = RequestBody::Form(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    pub fn multipart(mut self, fields: Vec<MultipartField>) -> Self {
        self.body = RequestBody::Multipart(fields);
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// A 401 on this request is returned as-is instead of starting the
    /// refresh protocol. Used for the credential endpoints themselves.
    pub fn without_refresh(mut self) -> Self {
        self.refresh_on_unauthorized = false;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    pub fn is_retried(&self) -> bool {
        self.retried
    }

    pub fn refreshes_on_unauthorized(&self) -> bool {
        self.refresh_on_unauthorized
    }

    pub(crate) fn mark_retried(&mut self) {
        self.retried = true;
    }

    /// Paths are joined onto the configured base URL, so absolute URLs and
    /// paths without a leading slash are refused.
    pub(crate) fn validate_path(&self) -> Result<(), ApiError> {
        if !self.path.starts_with('/') || self.path.starts_with("//") || self.path.contains("://") {
            return Err(ApiError::InvalidRequest(format!(
                "path must be relative to the API base URL: {}",
                self.path
            )));
        }
        Ok(())
    }

    /// Attaches the body to a transport request; called once per dispatch.
    pub(crate) fn apply_body(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, ApiError> {
        let builder = match &self.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Form(fields) => builder.form(fields),
            RequestBody::Multipart(fields) => {
                let mut form = Form::new();
                for field in fields {
                    form = form.part(field.name.clone(), field.to_part()?);
                }
                builder.multipart(form)
            }
        };
        Ok(builder)
    }
}
