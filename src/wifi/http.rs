#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpError {
    InizializationError,
    ListeningError,
    RequestError,
}

/// HTTP methods the node issues
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Post,
}

/// The Http trait gives the implementation on how to send a request and read the status
/// of its response
pub trait Http {
    /// Sends an HTTP request to a specified URI with the given method, headers, and optional
    /// body, and waits for the response headers.
    ///
    /// # Arguments
    ///
    /// - `method`: The HTTP method to use for the request.
    /// - `uri`: The URI to which the request will be sent.
    /// - `headers`: HTTP headers to include with the request.
    /// - `body`: An optional body. If `None`, no body is sent.
    ///
    /// # Errors
    ///
    /// - `HttpError::RequestError`: If an error occurs in while creating or sending the request.
    /// - `HttpError::ListeningError`: If the response cannot be read.
    fn send_request(
        &mut self,
        method: HttpMethod,
        uri: &str,
        headers: Vec<HttpHeader>,
        body: Option<String>,
    ) -> Result<(), HttpError>;

    /// Gets the response status code of the last done request
    fn response_status(&mut self) -> u16;

    /// Checks whether the "Content-Length" header is in the headers section, if not it adds it
    ///
    /// # Arguments
    ///
    /// - `headers`: The headers of the request.
    /// - `body_len`: Length of the request body, if there is one.
    fn add_body_len_header(&self, headers: &mut Vec<HttpHeader>, body_len: Option<usize>) {
        if let Some(body_len) = body_len {
            let has_content_length = headers
                .iter()
                .any(|header| header.header_type == HttpHeaderType::ContentLength);

            if !has_content_length {
                headers.push(HttpHeader::new(
                    HttpHeaderType::ContentLength,
                    body_len.to_string(),
                ));
            }
        }
    }

    /// Does an HTTP POST on the desired uri with the designated headers and returns the
    /// response status code.
    ///
    /// # Errors
    ///
    /// - `HttpError::RequestError`: If the request fails.
    /// - `HttpError::ListeningError`: If no response is received.
    fn post(
        &mut self,
        uri: &str,
        mut headers: Vec<HttpHeader>,
        body: Option<String>,
    ) -> Result<u16, HttpError> {
        self.add_body_len_header(&mut headers, body.as_ref().map(|body| body.len()));
        self.send_request(HttpMethod::Post, uri, headers, body)?;
        Ok(self.response_status())
    }
}

/// Simple abstraction of a header used for HTTP requests. It contains:
/// - `header_type`: The type of header to be used
/// - `value`: The value associated to the header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpHeader {
    header_type: HttpHeaderType,
    value: String,
}

impl HttpHeader {
    pub fn new(header_type: HttpHeaderType, value: String) -> Self {
        HttpHeader { header_type, value }
    }

    pub fn name(&self) -> &'static str {
        self.header_type.as_str()
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// HTTP headers the node sends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpHeaderType {
    Accept,
    Authorization,
    ContentLength,
    ContentType,
}

impl HttpHeaderType {
    fn as_str(&self) -> &'static str {
        match self {
            HttpHeaderType::Accept => "Accept",
            HttpHeaderType::Authorization => "Authorization",
            HttpHeaderType::ContentLength => "Content-Length",
            HttpHeaderType::ContentType => "Content-Type",
        }
    }
}

#[cfg(target_os = "espidf")]
pub use esp::HttpClient;

#[cfg(target_os = "espidf")]
mod esp {
    use esp_idf_svc::{
        http::{
            client::{Configuration, EspHttpConnection},
            Method,
        },
        io::Write,
    };

    use super::{Http, HttpError, HttpHeader, HttpMethod};

    /// Abstraction to simply make HTTP request as a client
    pub struct HttpClient {
        connection: EspHttpConnection,
    }

    impl HttpClient {
        /// Creates a new HttpClient
        ///
        /// # Errors
        ///
        /// - `HttpError::InizializationError`: If the creation of the Http connection fails
        pub fn new() -> Result<Self, HttpError> {
            let config: &Configuration = &Default::default();
            let connection =
                EspHttpConnection::new(config).map_err(|_| HttpError::InizializationError)?;
            Ok(HttpClient { connection })
        }
    }

    impl From<HttpMethod> for Method {
        fn from(value: HttpMethod) -> Self {
            match value {
                HttpMethod::Post => Method::Post,
            }
        }
    }

    impl Http for HttpClient {
        fn send_request(
            &mut self,
            method: HttpMethod,
            uri: &str,
            headers: Vec<HttpHeader>,
            body: Option<String>,
        ) -> Result<(), HttpError> {
            let temp: Vec<(&str, &str)> = headers
                .iter()
                .map(|header| (header.name(), header.value()))
                .collect();
            self.connection
                .initiate_request(method.into(), uri, &temp)
                .map_err(|_| HttpError::RequestError)?;
            if let Some(body_content) = body {
                self.connection
                    .write_all(body_content.as_bytes())
                    .map_err(|_| HttpError::RequestError)?;
            }
            self.connection
                .initiate_response()
                .map_err(|_| HttpError::ListeningError)
        }

        fn response_status(&mut self) -> u16 {
            self.connection.status()
        }
    }
}
