//! Map scan results back to hostnames using sanicdns output.
//!
//! sanicdns emits newline-delimited JSON, one resolution per line. This
//! module builds an IP-to-hostnames index from the A and AAAA answers,
//! resolves CNAME chains to the addresses they ultimately point at, and
//! joins the index against an `ip[:port]` target list, emitting
//! `host[:port]` lines. Malformed input never aborts a run; each skipped
//! line is reported as a warning carrying its line number.

use anyhow::Result;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io::BufRead;
use std::net::IpAddr;

/// CNAME chains longer than this are abandoned; a chain this deep is a
/// loop or a misconfiguration either way.
pub const MAX_CNAME_DEPTH: usize = 10;

/// One sanicdns result line. Only the fields the mapper needs.
#[derive(Debug, Deserialize)]
struct DnsRecord {
    #[serde(default)]
    name: String,
    #[serde(default)]
    data: RecordData,
}

#[derive(Debug, Default, Deserialize)]
struct RecordData {
    #[serde(default)]
    answers: Vec<Answer>,
}

#[derive(Debug, Deserialize)]
struct Answer {
    #[serde(rename = "type", default)]
    rr_type: Option<String>,
    #[serde(default)]
    data: Option<String>,
}

/// A skipped input line, with enough detail for a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapWarning {
    /// NDJSON line that did not parse as a record.
    InvalidJson { line: usize },
    /// Target list entry whose IP part is not an address.
    InvalidIp { line: usize, entry: String },
    /// Target list IP with no hostname in the index.
    UnmappedIp { line: usize, ip: String },
}

impl fmt::Display for MapWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapWarning::InvalidJson { line } => {
                write!(f, "skipping invalid JSON on line {}", line)
            }
            MapWarning::InvalidIp { line, entry } => {
                write!(f, "invalid IP on line {}: {:?}", line, entry)
            }
            MapWarning::UnmappedIp { line, ip } => {
                write!(f, "no hostname for IP {} (line {})", ip, line)
            }
        }
    }
}

/// IP-to-hostnames index built from sanicdns NDJSON output.
#[derive(Debug, Default)]
pub struct IpMap {
    by_ip: HashMap<String, Vec<String>>,
    by_host: HashMap<String, Vec<String>>,
}

impl IpMap {
    /// Build the index from newline-delimited JSON.
    ///
    /// Blank lines and lines not starting with `{` are skipped silently;
    /// unparsable JSON lines produce a warning. After the direct A/AAAA
    /// answers are collected, CNAME hosts are attached to every address
    /// their chain resolves to.
    pub fn from_ndjson<R: BufRead>(reader: R) -> Result<(Self, Vec<MapWarning>)> {
        let mut map = IpMap::default();
        let mut warnings = Vec::new();
        let mut cnames: HashMap<String, String> = HashMap::new();
        let mut cname_order: Vec<String> = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let lineno = idx + 1;
            let line = line?;
            let line = line.trim();
            if line.is_empty() || !line.starts_with('{') {
                continue;
            }
            let record: DnsRecord = match serde_json::from_str(line) {
                Ok(r) => r,
                Err(_) => {
                    warnings.push(MapWarning::InvalidJson { line: lineno });
                    continue;
                }
            };
            let host = record.name.trim_end_matches('.');
            if host.is_empty() {
                continue;
            }
            for answer in &record.data.answers {
                let (Some(rr_type), Some(data)) = (answer.rr_type.as_deref(), answer.data.as_deref())
                else {
                    continue;
                };
                if data.is_empty() {
                    continue;
                }
                match rr_type {
                    "A" | "AAAA" => {
                        if data.parse::<IpAddr>().is_ok() {
                            map.add(data, host);
                        }
                    }
                    "CNAME" => {
                        let target = data.trim_end_matches('.').to_string();
                        if cnames.insert(host.to_string(), target).is_none() {
                            cname_order.push(host.to_string());
                        }
                    }
                    _ => {}
                }
            }
        }

        for cname_host in &cname_order {
            let mut visited = HashSet::new();
            let ips = resolve_chain(&cnames[cname_host], &cnames, &map.by_host, &mut visited);
            for ip in ips {
                map.add_unique(&ip, cname_host);
            }
        }

        Ok((map, warnings))
    }

    /// Hostnames recorded for an IP, in input order.
    pub fn lookup(&self, ip: &str) -> Option<&[String]> {
        self.by_ip.get(ip).map(Vec::as_slice)
    }

    /// Join the index against an `ip[:port]` target list. Returns the
    /// emitted `host[:port]` lines and the warnings for entries that
    /// could not be mapped.
    pub fn join<R: BufRead>(&self, reader: R) -> Result<(Vec<String>, Vec<MapWarning>)> {
        let mut out = Vec::new();
        let mut warnings = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let lineno = idx + 1;
            let line = line?;
            let entry = line.trim();
            if entry.is_empty() {
                continue;
            }
            let (ip_part, port) = match entry.split_once(':') {
                Some((ip, port)) => (ip, Some(port)),
                None => (entry, None),
            };
            if ip_part.parse::<IpAddr>().is_err() {
                warnings.push(MapWarning::InvalidIp {
                    line: lineno,
                    entry: ip_part.to_string(),
                });
                continue;
            }
            match self.by_ip.get(ip_part) {
                Some(hosts) if !hosts.is_empty() => {
                    for host in hosts {
                        out.push(match port {
                            Some(port) => format!("{}:{}", host, port),
                            None => host.clone(),
                        });
                    }
                }
                _ => warnings.push(MapWarning::UnmappedIp {
                    line: lineno,
                    ip: ip_part.to_string(),
                }),
            }
        }

        Ok((out, warnings))
    }

    fn add(&mut self, ip: &str, host: &str) {
        self.by_ip
            .entry(ip.to_string())
            .or_default()
            .push(host.to_string());
        self.by_host
            .entry(host.to_string())
            .or_default()
            .push(ip.to_string());
    }

    fn add_unique(&mut self, ip: &str, host: &str) {
        let hosts = self.by_ip.entry(ip.to_string()).or_default();
        if !hosts.iter().any(|h| h == host) {
            hosts.push(host.to_string());
        }
    }
}

/// Follow a CNAME chain and collect every address it resolves to. The
/// visited set terminates loops; the depth cap bounds pathological
/// chains.
fn resolve_chain(
    target: &str,
    cnames: &HashMap<String, String>,
    by_host: &HashMap<String, Vec<String>>,
    visited: &mut HashSet<String>,
) -> Vec<String> {
    if visited.contains(target) || visited.len() >= MAX_CNAME_DEPTH {
        return Vec::new();
    }
    visited.insert(target.to_string());

    let mut ips = by_host.get(target).cloned().unwrap_or_default();
    if let Some(next) = cnames.get(target) {
        ips.extend(resolve_chain(next, cnames, by_host, visited));
    }
    ips
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, rr_type: &str, data: &str) -> String {
        format!(
            r#"{{"name":"{}","data":{{"answers":[{{"type":"{}","data":"{}"}}]}}}}"#,
            name, rr_type, data
        )
    }

    fn build(lines: &[String]) -> (IpMap, Vec<MapWarning>) {
        IpMap::from_ndjson(lines.join("\n").as_bytes()).unwrap()
    }

    #[test]
    fn a_and_aaaa_answers_build_the_index() {
        let (map, warnings) = build(&[
            record("one.example.com.", "A", "192.0.2.1"),
            record("two.example.com.", "AAAA", "2001:db8::2"),
        ]);
        assert!(warnings.is_empty());
        assert_eq!(
            map.lookup("192.0.2.1"),
            Some(&["one.example.com".to_string()][..])
        );
        assert_eq!(
            map.lookup("2001:db8::2"),
            Some(&["two.example.com".to_string()][..])
        );
    }

    #[test]
    fn non_ip_answer_data_is_ignored() {
        let (map, warnings) = build(&[record("bad.example.com", "A", "not-an-ip")]);
        assert!(warnings.is_empty());
        assert!(map.lookup("not-an-ip").is_none());
    }

    #[test]
    fn invalid_json_line_warns_and_continues() {
        let input = format!(
            "{{broken json\n{}\n",
            record("ok.example.com", "A", "192.0.2.9")
        );
        let (map, warnings) = IpMap::from_ndjson(input.as_bytes()).unwrap();
        assert_eq!(warnings, vec![MapWarning::InvalidJson { line: 1 }]);
        assert!(map.lookup("192.0.2.9").is_some());
    }

    #[test]
    fn blank_and_non_json_lines_are_skipped_silently() {
        let input = format!(
            "\n# comment\n{}\n",
            record("ok.example.com", "A", "192.0.2.9")
        );
        let (map, warnings) = IpMap::from_ndjson(input.as_bytes()).unwrap();
        assert!(warnings.is_empty());
        assert!(map.lookup("192.0.2.9").is_some());
    }

    #[test]
    fn cname_chain_resolves_to_final_address() {
        // www -> cdn -> edge, and only edge has an A record.
        let (map, _) = build(&[
            record("www.example.com", "CNAME", "cdn.example.com."),
            record("cdn.example.com", "CNAME", "edge.example.com."),
            record("edge.example.com", "A", "192.0.2.50"),
        ]);
        let hosts = map.lookup("192.0.2.50").unwrap();
        assert!(hosts.contains(&"edge.example.com".to_string()));
        assert!(hosts.contains(&"cdn.example.com".to_string()));
        assert!(hosts.contains(&"www.example.com".to_string()));
    }

    #[test]
    fn cname_loop_terminates_without_addresses() {
        let (map, _) = build(&[
            record("a.example.com", "CNAME", "b.example.com"),
            record("b.example.com", "CNAME", "a.example.com"),
            record("other.example.com", "A", "192.0.2.80"),
        ]);
        // The loop resolves to nothing; the unrelated record is intact.
        assert_eq!(
            map.lookup("192.0.2.80"),
            Some(&["other.example.com".to_string()][..])
        );
        for ip in ["192.0.2.80"] {
            let hosts = map.lookup(ip).unwrap();
            assert!(!hosts.contains(&"a.example.com".to_string()));
            assert!(!hosts.contains(&"b.example.com".to_string()));
        }
    }

    #[test]
    fn cname_chain_beyond_depth_cap_is_abandoned() {
        // h0 -> h1 -> ... -> h11, with the A record only at the far end.
        let mut lines: Vec<String> = (0..11)
            .map(|i| record(&format!("h{}.example.com", i), "CNAME", &format!("h{}.example.com", i + 1)))
            .collect();
        lines.push(record("h11.example.com", "A", "192.0.2.99"));
        let (map, _) = build(&lines);

        let hosts = map.lookup("192.0.2.99").unwrap();
        // Too deep from h0; reachable within the cap from h5.
        assert!(!hosts.contains(&"h0.example.com".to_string()));
        assert!(hosts.contains(&"h5.example.com".to_string()));
    }

    #[test]
    fn join_emits_host_port_lines() {
        let (map, _) = build(&[
            record("one.example.com", "A", "192.0.2.1"),
            record("alias.example.com", "CNAME", "one.example.com"),
        ]);
        let (lines, warnings) = map.join("192.0.2.1:443\n192.0.2.1\n".as_bytes()).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(
            lines,
            vec![
                "one.example.com:443".to_string(),
                "alias.example.com:443".to_string(),
                "one.example.com".to_string(),
                "alias.example.com".to_string(),
            ]
        );
    }

    #[test]
    fn join_warns_on_invalid_and_unmapped_ips() {
        let (map, _) = build(&[record("one.example.com", "A", "192.0.2.1")]);
        let (lines, warnings) = map
            .join("not-an-ip:80\n\n198.51.100.7:22\n192.0.2.1:8080\n".as_bytes())
            .unwrap();
        assert_eq!(lines, vec!["one.example.com:8080".to_string()]);
        assert_eq!(
            warnings,
            vec![
                MapWarning::InvalidIp {
                    line: 1,
                    entry: "not-an-ip".to_string()
                },
                MapWarning::UnmappedIp {
                    line: 3,
                    ip: "198.51.100.7".to_string()
                },
            ]
        );
    }

    #[test]
    fn duplicate_cname_host_keeps_last_target() {
        let (map, _) = build(&[
            record("alias.example.com", "CNAME", "old.example.com"),
            record("alias.example.com", "CNAME", "new.example.com"),
            record("old.example.com", "A", "192.0.2.10"),
            record("new.example.com", "A", "192.0.2.20"),
        ]);
        let old = map.lookup("192.0.2.10").unwrap();
        let new = map.lookup("192.0.2.20").unwrap();
        assert!(!old.contains(&"alias.example.com".to_string()));
        assert!(new.contains(&"alias.example.com".to_string()));
    }
}
