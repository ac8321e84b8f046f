// src/output.rs
use crate::engine::AnalysisObserver;
use crate::expander::Identity;
use crate::types::{ContactFinding, DomainRecord, FootprintReport, Phase, ProbeResult};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::sync::Mutex;
use std::time::Duration;

/// Human-readable incremental output for the CLI.
pub struct ConsolePrinter<W: Write + Send> {
    writer: Mutex<W>,
    spinner: Mutex<Option<ProgressBar>>,
    show_spinner: bool,
}

impl ConsolePrinter<io::Stdout> {
    pub fn stdout(show_spinner: bool) -> Self {
        Self::new(io::stdout(), show_spinner)
    }
}

impl<W: Write + Send> ConsolePrinter<W> {
    pub fn new(writer: W, show_spinner: bool) -> Self {
        Self {
            writer: Mutex::new(writer),
            spinner: Mutex::new(None),
            show_spinner,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn emit(&self, lines: &[String]) {
        self.finish_spinner();
        let mut writer = match self.writer.lock() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        };
        for line in lines {
            // stdout closed under us; nothing useful to do
            if writeln!(writer, "{}", line).is_err() {
                return;
            }
        }
        let _ = writer.flush();
    }

    fn start_spinner(&self, message: String) {
        if !self.show_spinner {
            return;
        }
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(message);
        spinner.enable_steady_tick(Duration::from_millis(120));

        if let Ok(mut slot) = self.spinner.lock() {
            if let Some(previous) = slot.replace(spinner) {
                previous.finish_and_clear();
            }
        }
    }

    fn finish_spinner(&self) {
        if let Ok(mut slot) = self.spinner.lock() {
            if let Some(spinner) = slot.take() {
                spinner.finish_and_clear();
            }
        }
    }
}

pub fn domain_lines(domains: &BTreeMap<String, DomainRecord>) -> Vec<String> {
    if domains.is_empty() {
        return vec!["[-] No registered domains found".to_string()];
    }

    let mut lines = vec!["[+] Found registered domains:".to_string()];
    for (domain, record) in domains {
        lines.push(format!("    Domain: {}", domain));
        lines.push(format!("    URL: {}", record.url));
        if let Some(registrar) = &record.registrar {
            lines.push(format!("        registrar: {}", registrar));
        }
        if let Some(created) = &record.creation_date {
            lines.push(format!("        creation_date: {}", created));
        }
        if let Some(expires) = &record.expiration_date {
            lines.push(format!("        expiration_date: {}", expires));
        }
        if !record.emails.is_empty() {
            lines.push(format!("        emails: {}", record.emails.join(", ")));
        }
    }
    lines
}

pub fn profile_lines(profiles: &BTreeMap<String, ProbeResult>) -> Vec<String> {
    let found: Vec<(&String, &ProbeResult)> = profiles.iter().filter(|(_, r)| r.exists).collect();
    if found.is_empty() {
        return vec!["[-] No social media profiles found".to_string()];
    }

    let mut lines = Vec::new();
    for (platform, result) in found {
        let url = result.profile_url.as_deref().unwrap_or_default();
        if result.attributes.is_empty() {
            lines.push(format!("[+] {} profile found: {}", platform, url));
        } else {
            lines.push(format!("[+] {} profile found:", platform));
            lines.push(format!("    profile_url: {}", url));
            for (key, value) in &result.attributes {
                lines.push(format!("    {}: {}", key, value));
            }
        }
    }
    lines
}

pub fn contact_lines(contacts: &ContactFinding) -> Vec<String> {
    if contacts.is_empty() {
        return vec!["[-] No contact information found".to_string()];
    }

    let mut lines = Vec::new();
    if !contacts.emails.is_empty() {
        lines.push("[+] Found potential email addresses:".to_string());
        lines.extend(contacts.emails.iter().map(|e| format!("    {}", e)));
    }
    if !contacts.phone_numbers.is_empty() {
        lines.push("[+] Found potential phone numbers:".to_string());
        lines.extend(contacts.phone_numbers.iter().map(|n| format!("    {}", n)));
    }
    lines
}

impl<W: Write + Send> AnalysisObserver for ConsolePrinter<W> {
    fn on_start(&self, identity: &Identity) {
        let variations: Vec<&str> = identity.variations().iter().map(String::as_str).collect();
        self.emit(&[
            format!(
                "\n[*] Starting Digital Footprint Analysis for variations of: {}",
                identity.input()
            ),
            format!("[*] Checking variations: {}", variations.join(", ")),
        ]);
    }

    fn on_variation(&self, variation: &str) {
        self.emit(&[format!("\n[*] Analyzing variation: {}", variation)]);
    }

    fn on_phase(&self, variation: &str, phase: Phase) {
        // Domains and platforms run together; their headers print with results
        if phase == Phase::Contacts {
            self.emit(&[format!("\n[*] Searching for {}...", phase)]);
        }
        self.start_spinner(format!("{}: checking {}", variation, phase));
    }

    fn on_domains(&self, _variation: &str, domains: &BTreeMap<String, DomainRecord>) {
        let mut lines = vec![format!("\n[*] Checking {}...", Phase::Domains)];
        lines.extend(domain_lines(domains));
        self.emit(&lines);
    }

    fn on_profiles(&self, _variation: &str, profiles: &BTreeMap<String, ProbeResult>) {
        let mut lines = vec![format!("\n[*] Checking {}...", Phase::Platforms)];
        lines.extend(profile_lines(profiles));
        self.emit(&lines);
    }

    fn on_contacts(&self, _variation: &str, contacts: &ContactFinding) {
        self.emit(&contact_lines(contacts));
    }

    fn on_phase_error(&self, _variation: &str, phase: Phase, message: &str) {
        self.emit(&[format!("[!] Error checking {}: {}", phase, message)]);
    }

    fn on_finish(&self, report: &FootprintReport) {
        let domains: usize = report.variations.values().map(|v| v.domains.len()).sum();
        let profiles: usize = report
            .variations
            .values()
            .map(|v| v.found_profiles().count())
            .sum();
        self.emit(&[format!(
            "\n[*] Done: {} variations, {} registered domains, {} profiles",
            report.variations.len(),
            domains,
            profiles
        )]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::engine;

    #[test]
    fn test_profile_lines() {
        let mut attributes = BTreeMap::new();
        attributes.insert("name".to_string(), "J. Doe".to_string());
        let profiles = BTreeMap::from([
            (
                "GitHub".to_string(),
                ProbeResult::found_with("https://github.com/jdoe", attributes),
            ),
            ("Reddit".to_string(), ProbeResult::found("https://reddit.com/user/jdoe")),
            ("Vimeo".to_string(), ProbeResult::missing()),
        ]);

        assert_eq!(
            profile_lines(&profiles),
            vec![
                "[+] GitHub profile found:",
                "    profile_url: https://github.com/jdoe",
                "    name: J. Doe",
                "[+] Reddit profile found: https://reddit.com/user/jdoe",
            ]
        );
    }

    #[test]
    fn test_empty_sections() {
        assert_eq!(domain_lines(&BTreeMap::new()), vec!["[-] No registered domains found"]);
        assert_eq!(
            contact_lines(&ContactFinding::default()),
            vec!["[-] No contact information found"]
        );
    }

    #[tokio::test]
    async fn test_printer_writes_incremental_report() {
        let printer = ConsolePrinter::new(Vec::new(), false);
        engine(false).analyze_observed("jdoe", &printer).await;

        let output = String::from_utf8(printer.into_inner()).unwrap();
        let headers: Vec<&str> = output.lines().filter(|l| l.starts_with("[*]")).collect();
        assert_eq!(
            headers,
            vec![
                "[*] Starting Digital Footprint Analysis for variations of: jdoe",
                "[*] Checking variations: jdoe",
                "[*] Analyzing variation: jdoe",
                "[*] Checking domain registrations...",
                "[*] Checking social media presence...",
                "[*] Searching for contact information...",
                "[*] Done: 1 variations, 1 registered domains, 2 profiles",
            ]
        );
        assert!(output.contains("    Domain: jdoe.com"));
        assert!(output.contains("[+] Reddit profile found: https://reddit.test/user/jdoe"));
        assert!(output.contains("    jdoe@mail.test"));
        assert!(output.contains("    +1 415-555-2671"));
    }
}
