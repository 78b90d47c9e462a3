//! Blocking HTTP outcome backend.
//!
//! Posts the batter's `pow`/`hit`/`eye`/`hbp_rate` to an endpoint that answers
//! `{"outcome": "1B", "probabilities": {...}}` with one of the wire codes.
//! Any transport or decode failure surfaces as a `ResolveError`, which the
//! state machine turns into a generic out.
use rand::RngCore;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use super::{OutFlavor, Outcome, OutcomeResolver, WireCode};
use crate::error::ResolveError;
use crate::player::{Batter, Pitcher};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the reference simulation service listens.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/api/v1/simulate_at_bat";

/// The service rates batters on a 0-99 scale; rosters use 1-10.
const SERVICE_ATTRIBUTE_SCALE: f64 = 9.9;
const DEFAULT_HBP_RATE: f64 = 0.010;

#[derive(Debug, Serialize)]
struct AtBatRequest {
    pow: f64,
    hit: f64,
    eye: f64,
    hbp_rate: f64,
}

impl AtBatRequest {
    fn for_batter(batter: &Batter) -> Self {
        let scaled = |value: u8| f64::from(value) * SERVICE_ATTRIBUTE_SCALE;
        Self {
            pow: scaled(batter.attributes.power),
            hit: scaled(batter.attributes.hit_rate),
            eye: scaled(batter.attributes.contact),
            hbp_rate: DEFAULT_HBP_RATE,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AtBatResponse {
    outcome: String,
    #[serde(default)]
    probabilities: Option<BTreeMap<String, f64>>,
}

/// Resolver delegating each at-bat to a remote service.
pub struct HttpResolver {
    client: Client,
    endpoint: String,
}

impl HttpResolver {
    /// Build a resolver for `endpoint` with the default request timeout.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::Unavailable` when the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, ResolveError> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|err| ResolveError::Unavailable(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_code(&self, batter: &Batter) -> Result<String, ResolveError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&AtBatRequest::for_batter(batter))
            .send()
            .map_err(|err| ResolveError::Unavailable(err.to_string()))?;

        if !response.status().is_success() {
            return Err(ResolveError::Unavailable(format!(
                "{} returned {}",
                self.endpoint,
                response.status()
            )));
        }

        let text = response
            .text()
            .map_err(|err| ResolveError::Unavailable(err.to_string()))?;
        let parsed: AtBatResponse = serde_json::from_str(&text)?;
        if let Some(probabilities) = &parsed.probabilities {
            log::trace!("service probabilities for {}: {probabilities:?}", batter.name);
        }
        Ok(parsed.outcome)
    }
}

impl OutcomeResolver for HttpResolver {
    fn resolve(
        &mut self,
        batter: &Batter,
        _pitcher: &Pitcher,
        rng: &mut dyn RngCore,
    ) -> Result<Outcome, ResolveError> {
        let code: WireCode = self.request_code(batter)?.parse()?;
        let event = code.into_event(OutFlavor::pick(rng));
        log::debug!("remote resolver answered {code} for {}", batter.name);
        Ok(Outcome::new(event, &batter.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::PlateEvent;
    use crate::rng::ScriptedRolls;
    use crate::roster::RosterBook;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    /// Answer one POST with `body` and hand back the request body.
    fn serve_once(body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let url = format!("http://{}/api/v1/simulate_at_bat", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let mut request = Vec::new();
            let mut chunk = [0_u8; 1024];
            let (header_end, length) = loop {
                let read = stream.read(&mut chunk).expect("read");
                assert!(read > 0, "client hung up early");
                request.extend_from_slice(&chunk[..read]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text[..end]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    break (end + 4, length);
                }
            };
            while request.len() < header_end + length {
                let read = stream.read(&mut chunk).expect("read body");
                assert!(read > 0, "client hung up early");
                request.extend_from_slice(&chunk[..read]);
            }
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).expect("write");
            String::from_utf8_lossy(&request[header_end..header_end + length]).to_string()
        });
        (url, handle)
    }

    fn matchup() -> (Batter, Pitcher) {
        let team = RosterBook::builtin().get("NYY").expect("yankees");
        (
            Batter::from_def(&team.batters[2]),
            Pitcher::from_def(&team.pitchers.rotation[0]),
        )
    }

    #[test]
    fn service_answer_becomes_outcome() {
        let (url, server) = serve_once(r#"{"outcome":"HR","probabilities":{"HR":0.05,"IPO":0.6}}"#);
        let (batter, pitcher) = matchup();
        let mut resolver = HttpResolver::new(url).expect("client builds");
        let outcome = resolver
            .resolve(&batter, &pitcher, &mut ScriptedRolls::default())
            .expect("service answered");
        assert_eq!(outcome.event, PlateEvent::HomeRun);

        let sent: serde_json::Value =
            serde_json::from_str(&server.join().expect("server thread")).expect("json body");
        let scaled = |value: u8| f64::from(value) * SERVICE_ATTRIBUTE_SCALE;
        assert_eq!(sent["pow"].as_f64(), Some(scaled(batter.attributes.power)));
        assert_eq!(sent["hit"].as_f64(), Some(scaled(batter.attributes.hit_rate)));
        assert_eq!(sent["eye"].as_f64(), Some(scaled(batter.attributes.contact)));
        assert_eq!(sent["hbp_rate"].as_f64(), Some(DEFAULT_HBP_RATE));
    }

    #[test]
    fn in_play_out_without_probabilities_is_an_out() {
        let (url, server) = serve_once(r#"{"outcome":"IPO"}"#);
        let (batter, pitcher) = matchup();
        let mut resolver = HttpResolver::new(url).expect("client builds");
        let mut rolls = ScriptedRolls::new([0.1]);
        let outcome = resolver.resolve(&batter, &pitcher, &mut rolls).expect("answered");
        assert!(matches!(outcome.event, PlateEvent::Out(_)));
        server.join().expect("server thread");
    }

    #[test]
    fn unknown_service_code_is_rejected() {
        let (url, server) = serve_once(r#"{"outcome":"GIDP","probabilities":null}"#);
        let (batter, pitcher) = matchup();
        let mut resolver = HttpResolver::new(url).expect("client builds");
        assert!(matches!(
            resolver.resolve(&batter, &pitcher, &mut ScriptedRolls::default()),
            Err(ResolveError::UnknownCode(code)) if code == "GIDP"
        ));
        server.join().expect("server thread");
    }

    #[test]
    fn unreachable_endpoint_is_a_resolve_error() {
        let (batter, pitcher) = matchup();
        let mut resolver = HttpResolver::new("http://127.0.0.1:9/at-bat").expect("client builds");
        assert_eq!(resolver.endpoint(), "http://127.0.0.1:9/at-bat");
        let mut rolls = ScriptedRolls::default();
        assert!(matches!(
            resolver.resolve(&batter, &pitcher, &mut rolls),
            Err(ResolveError::Unavailable(_))
        ));
    }
}
