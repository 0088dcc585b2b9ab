//! DNS lookups against a single name server.
//!
//! Each [`DnsLookup`] wraps a hickory resolver pinned to exactly one
//! upstream, so the pool above it decides which server a query goes to.

use super::Lookup;
use crate::types::{LookupOutcome, ResolverEndpoint};
use async_trait::async_trait;
use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::proto::op::ResponseCode;
use hickory_resolver::proto::ProtoErrorKind;
use hickory_resolver::{ResolveError, TokioResolver};
use std::net::SocketAddr;
use tracing::trace;

/// Resolver bound to one name server with its own timeout and retry budget.
pub struct DnsLookup {
    address: SocketAddr,
    resolver: TokioResolver,
}

impl DnsLookup {
    /// Build a resolver for `endpoint`.
    ///
    /// Negative answers are trusted, so an NXDOMAIN from this server is
    /// final instead of being retried elsewhere.
    pub fn new(endpoint: &ResolverEndpoint) -> Self {
        let servers = NameServerConfigGroup::from_ips_clear(
            &[endpoint.address.ip()],
            endpoint.address.port(),
            true,
        );
        let config = ResolverConfig::from_parts(None, vec![], servers);

        let mut opts = ResolverOpts::default();
        opts.timeout = endpoint.timeout;
        opts.attempts = endpoint.retries;

        let resolver =
            TokioResolver::builder_with_config(config, TokioConnectionProvider::default())
                .with_options(opts)
                .build();

        Self {
            address: endpoint.address,
            resolver,
        }
    }
}

/// Response code of an answer that carried no usable records.
///
/// hickory folds NXDOMAIN, NOERROR/empty and server-side refusals such as
/// SERVFAIL or REFUSED into the same "no records" error; only the code
/// tells them apart.
fn empty_answer_code(err: &ResolveError) -> Option<ResponseCode> {
    match err.proto()?.kind() {
        ProtoErrorKind::NoRecordsFound { response_code, .. } => Some(*response_code),
        _ => None,
    }
}

#[async_trait]
impl Lookup for DnsLookup {
    async fn lookup(&self, domain: &str) -> LookupOutcome {
        // Fully qualified, so no search domains are appended.
        let fqdn = format!("{}.", domain.trim_end_matches('.'));

        let err = match self.resolver.ipv4_lookup(fqdn.as_str()).await {
            Ok(_) => return LookupOutcome::Resolved,
            Err(e) => e,
        };

        match empty_answer_code(&err) {
            Some(ResponseCode::NXDomain) => LookupOutcome::NonExistent,
            // NOERROR with an empty answer: the name exists.
            Some(ResponseCode::NoError) => LookupOutcome::Resolved,
            Some(code) => {
                trace!(domain, server = %self.address, rcode = %code, "server error");
                LookupOutcome::TransientFailure(format!("server answered {}", code))
            }
            None => {
                trace!(domain, server = %self.address, error = %err, "lookup failed");
                LookupOutcome::TransientFailure(err.to_string())
            }
        }
    }

    fn endpoint(&self) -> String {
        self.address.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hickory_resolver::proto::op::{Message, MessageType};
    use hickory_resolver::proto::rr::rdata::A;
    use hickory_resolver::proto::rr::{RData, Record};
    use std::net::UdpSocket;
    use std::time::Duration;

    /// Loopback name server whose answer depends on the first label:
    /// `nx`, `empty`, `fail`, `refused`, `drop` (no reply) or anything else
    /// (one A record).
    fn spawn_scripted_server() -> SocketAddr {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        socket.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        let address = socket.local_addr().unwrap();

        std::thread::spawn(move || {
            let mut buf = [0u8; 512];
            while let Ok((len, peer)) = socket.recv_from(&mut buf) {
                let Ok(request) = Message::from_vec(&buf[..len]) else {
                    continue;
                };
                let Some(query) = request.queries().first().cloned() else {
                    continue;
                };
                let name = query.name().to_string();
                let label = name.split('.').next().unwrap_or_default().to_string();

                let mut response = Message::new();
                response
                    .set_id(request.id())
                    .set_message_type(MessageType::Response)
                    .set_op_code(request.op_code())
                    .set_recursion_desired(request.recursion_desired())
                    .set_recursion_available(true)
                    .add_query(query.clone());

                match label.as_str() {
                    "drop" => continue,
                    "nx" => {
                        response.set_response_code(ResponseCode::NXDomain);
                    }
                    "empty" => {
                        response.set_response_code(ResponseCode::NoError);
                    }
                    "fail" => {
                        response.set_response_code(ResponseCode::ServFail);
                    }
                    "refused" => {
                        response.set_response_code(ResponseCode::Refused);
                    }
                    _ => {
                        response.set_response_code(ResponseCode::NoError);
                        response.add_answer(Record::from_rdata(
                            query.name().clone(),
                            60,
                            RData::A(A::new(127, 0, 0, 1)),
                        ));
                    }
                }

                if let Ok(bytes) = response.to_vec() {
                    let _ = socket.send_to(&bytes, peer);
                }
            }
        });

        address
    }

    #[tokio::test]
    async fn test_response_codes_map_to_outcomes() {
        let address = spawn_scripted_server();
        let lookup = DnsLookup::new(&ResolverEndpoint {
            address,
            timeout: Duration::from_millis(200),
            retries: 1,
        });

        assert_eq!(lookup.lookup("taken.test").await, LookupOutcome::Resolved);
        assert_eq!(lookup.lookup("nx.test").await, LookupOutcome::NonExistent);
        assert_eq!(lookup.lookup("empty.test").await, LookupOutcome::Resolved);

        for domain in ["fail.test", "refused.test", "drop.test"] {
            let outcome = lookup.lookup(domain).await;
            assert!(
                matches!(outcome, LookupOutcome::TransientFailure(_)),
                "{} => {:?}",
                domain,
                outcome
            );
        }
        assert_eq!(lookup.endpoint(), address.to_string());
    }
}
