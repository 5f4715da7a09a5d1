use super::line_protocol::LineProtocolRecord;
use crate::{
    config,
    sensors::Distance,
    wifi::http::{Http, HttpError, HttpHeader, HttpHeaderType},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryError {
    /// The request could not be sent or no response came back
    Transport(HttpError),
    /// The server answered with a non 2xx status
    Rejected(u16),
}

impl From<HttpError> for TelemetryError {
    fn from(value: HttpError) -> Self {
        Self::Transport(value)
    }
}

/// Ships distance samples off the node. Failures are reported to the caller and never
/// retried.
pub trait TelemetryPublisher {
    /// # Errors
    ///
    /// - `TelemetryError::Transport`: If the sample cannot be delivered.
    /// - `TelemetryError::Rejected`: If the receiving end refuses it.
    fn publish(&mut self, distance: Distance) -> Result<(), TelemetryError>;
}

/// Writes samples to an InfluxDB v2 write endpoint
pub struct InfluxPublisher<H: Http> {
    client: H,
    url: String,
    token: String,
}

impl<H: Http> InfluxPublisher<H> {
    /// # Arguments
    ///
    /// - `client`: Http client used for every write.
    /// - `url`: Full write URL, including org, bucket and precision query parameters.
    /// - `token`: API token with write access to the bucket.
    pub fn new(client: H, url: &str, token: &str) -> Self {
        InfluxPublisher {
            client,
            url: url.to_string(),
            token: token.to_string(),
        }
    }

    /// Publisher for the configured endpoint and token
    pub fn from_config(client: H) -> Self {
        Self::new(client, config::INFLUX_API_URL, config::INFLUX_API_TOKEN)
    }

    fn headers(&self) -> Vec<HttpHeader> {
        vec![
            HttpHeader::new(
                HttpHeaderType::Authorization,
                format!("{} {}", config::INFLUX_AUTH_SCHEME, self.token),
            ),
            HttpHeader::new(
                HttpHeaderType::ContentType,
                "text/plain; charset=utf-8".to_string(),
            ),
            HttpHeader::new(HttpHeaderType::Accept, "application/json".to_string()),
        ]
    }
}

impl<H: Http> TelemetryPublisher for InfluxPublisher<H> {
    fn publish(&mut self, distance: Distance) -> Result<(), TelemetryError> {
        let record = LineProtocolRecord::for_distance(distance).to_string();
        log::debug!("Posting {record}");
        let headers = self.headers();
        let status = self.client.post(&self.url, headers, Some(record))?;
        if !(200..300).contains(&status) {
            return Err(TelemetryError::Rejected(status));
        }
        log::info!("Published {distance} (HTTP {status})");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wifi::http::HttpMethod;

    struct FakeInflux {
        status: u16,
        fail: Option<HttpError>,
        requests: Vec<(String, Vec<HttpHeader>, Option<String>)>,
    }

    impl FakeInflux {
        fn answering(status: u16) -> Self {
            FakeInflux {
                status,
                fail: None,
                requests: Vec::new(),
            }
        }
    }

    impl Http for FakeInflux {
        fn send_request(
            &mut self,
            method: HttpMethod,
            uri: &str,
            headers: Vec<HttpHeader>,
            body: Option<String>,
        ) -> Result<(), HttpError> {
            assert_eq!(method, HttpMethod::Post);
            if let Some(err) = self.fail {
                return Err(err);
            }
            self.requests.push((uri.to_string(), headers, body));
            Ok(())
        }

        fn response_status(&mut self) -> u16 {
            self.status
        }
    }

    fn header<'a>(headers: &'a [HttpHeader], name: &str) -> Option<&'a str> {
        headers
            .iter()
            .find(|header| header.name() == name)
            .map(|header| header.value())
    }

    #[test]
    fn posts_the_record_with_token_auth() {
        let mut publisher =
            InfluxPublisher::new(FakeInflux::answering(204), "http://influx/write", "s3cret");
        publisher.publish(Distance(1000)).unwrap();

        let (uri, headers, body) = &publisher.client.requests[0];
        assert_eq!(uri, "http://influx/write");
        assert_eq!(body.as_deref(), Some("distance,location=indoor mm=1000.0"));
        assert_eq!(header(headers, "Authorization"), Some("Token s3cret"));
        assert_eq!(
            header(headers, "Content-Type"),
            Some("text/plain; charset=utf-8")
        );
        assert_eq!(header(headers, "Content-Length"), Some("34"));
    }

    #[test]
    fn non_success_status_is_an_error() {
        let mut publisher =
            InfluxPublisher::new(FakeInflux::answering(401), "http://influx/write", "bad");
        assert_eq!(
            publisher.publish(Distance(5)),
            Err(TelemetryError::Rejected(401))
        );
    }

    #[test]
    fn transport_failure_is_reported_once() {
        let mut client = FakeInflux::answering(204);
        client.fail = Some(HttpError::RequestError);
        let mut publisher = InfluxPublisher::new(client, "http://influx/write", "t");
        assert_eq!(
            publisher.publish(Distance(5)),
            Err(TelemetryError::Transport(HttpError::RequestError))
        );
        assert!(publisher.client.requests.is_empty());
    }
}
