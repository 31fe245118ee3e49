//! Referral platform detection for survey responses.

use std::fmt;

/// Where a respondent came from, in display and match priority order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Platform {
    Facebook,
    WhatsApp,
    Instagram,
    LinkedIn,
    Twitter,
    ChromeIos,
    Edge,
    Firefox,
    Chrome,
    Safari,
    IosBrowser,
    AndroidBrowser,
    Unknown,
}

struct Rule {
    platform: Platform,
    agent_tokens: &'static [&'static str],
    referrer_hosts: &'static [&'static str],
}

/// First match wins. Tokens are lower-case.
const RULES: &[Rule] = &[
    Rule {
        platform: Platform::Facebook,
        agent_tokens: &["fban", "fbav", "fb_iab"],
        referrer_hosts: &["facebook.com", "fb.me", "fb.com"],
    },
    Rule {
        platform: Platform::WhatsApp,
        agent_tokens: &["whatsapp"],
        referrer_hosts: &["whatsapp.com", "wa.me"],
    },
    Rule {
        platform: Platform::Instagram,
        agent_tokens: &["instagram"],
        referrer_hosts: &["instagram.com"],
    },
    Rule {
        platform: Platform::LinkedIn,
        agent_tokens: &["linkedinapp"],
        referrer_hosts: &["linkedin.com", "lnkd.in"],
    },
    Rule {
        platform: Platform::Twitter,
        agent_tokens: &["twitter"],
        referrer_hosts: &["twitter.com", "t.co", "x.com"],
    },
    Rule {
        platform: Platform::ChromeIos,
        agent_tokens: &["crios"],
        referrer_hosts: &[],
    },
    Rule {
        platform: Platform::Edge,
        agent_tokens: &["edg/", "edga/", "edgios/"],
        referrer_hosts: &[],
    },
    Rule {
        platform: Platform::Firefox,
        agent_tokens: &["firefox/", "fxios/"],
        referrer_hosts: &[],
    },
    Rule {
        platform: Platform::Chrome,
        agent_tokens: &["chrome/"],
        referrer_hosts: &[],
    },
];

impl Platform {
    pub const ALL: [Platform; 13] = [
        Platform::Facebook,
        Platform::WhatsApp,
        Platform::Instagram,
        Platform::LinkedIn,
        Platform::Twitter,
        Platform::ChromeIos,
        Platform::Edge,
        Platform::Firefox,
        Platform::Chrome,
        Platform::Safari,
        Platform::IosBrowser,
        Platform::AndroidBrowser,
        Platform::Unknown,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Platform::Facebook => "Facebook",
            Platform::WhatsApp => "WhatsApp",
            Platform::Instagram => "Instagram",
            Platform::LinkedIn => "LinkedIn",
            Platform::Twitter => "Twitter",
            Platform::ChromeIos => "Chrome (iOS)",
            Platform::Edge => "Edge",
            Platform::Firefox => "Firefox",
            Platform::Chrome => "Chrome",
            Platform::Safari => "Safari",
            Platform::IosBrowser => "iOS Browser",
            Platform::AndroidBrowser => "Android Browser",
            Platform::Unknown => "Unknown",
        }
    }

    /// Parses a stored label. Anything unrecognised is `Unknown`.
    pub fn from_label(label: Option<&str>) -> Platform {
        label
            .and_then(|l| Platform::ALL.iter().find(|p| p.label() == l.trim()))
            .copied()
            .unwrap_or(Platform::Unknown)
    }

    /// Sniffs the platform from request headers.
    pub fn classify(user_agent: &str, referrer: Option<&str>) -> Platform {
        let agent = user_agent.to_lowercase();
        let host = referrer.and_then(referrer_host);

        for rule in RULES {
            if rule.agent_tokens.iter().any(|t| agent.contains(t)) {
                return rule.platform;
            }
            if let Some(host) = &host {
                if rule.referrer_hosts.iter().any(|h| host_matches(host, h)) {
                    return rule.platform;
                }
            }
        }

        if agent.contains("safari/") && agent.contains("version/") {
            Platform::Safari
        } else if ["iphone", "ipad", "ipod"].iter().any(|t| agent.contains(t)) {
            Platform::IosBrowser
        } else if agent.contains("android") {
            Platform::AndroidBrowser
        } else {
            Platform::Unknown
        }
    }

    /// Interprets a client-supplied platform name: a label or a short alias.
    pub fn from_override(value: &str) -> Option<Platform> {
        let value = value.trim().to_lowercase();
        if value.is_empty() {
            return None;
        }
        if let Some(p) = Platform::ALL
            .iter()
            .find(|p| p.label().to_lowercase() == value)
        {
            return Some(*p);
        }

        let platform = match value.as_str() {
            "fb" | "meta" => Platform::Facebook,
            "wa" | "whats_app" => Platform::WhatsApp,
            "ig" | "insta" => Platform::Instagram,
            "li" | "lnkd" => Platform::LinkedIn,
            "x" | "tw" => Platform::Twitter,
            "crios" | "chrome_ios" | "chrome-ios" => Platform::ChromeIos,
            "msedge" => Platform::Edge,
            "ff" => Platform::Firefox,
            "ios" => Platform::IosBrowser,
            "android" => Platform::AndroidBrowser,
            _ => return None,
        };
        Some(platform)
    }

    /// The first recognised override wins; otherwise the headers are sniffed.
    pub fn resolve<'a, I>(overrides: I, user_agent: &str, referrer: Option<&str>) -> Platform
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        overrides
            .into_iter()
            .flatten()
            .find_map(Platform::from_override)
            .unwrap_or_else(|| Platform::classify(user_agent, referrer))
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn referrer_host(referrer: &str) -> Option<String> {
    let referrer = referrer.trim();
    if referrer.is_empty() {
        return None;
    }
    match url::Url::parse(referrer) {
        Ok(url) => url.host_str().map(str::to_lowercase),
        // Bare hosts such as `t.co/abc` are accepted too.
        Err(_) => referrer
            .split('/')
            .next()
            .filter(|h| !h.is_empty())
            .map(str::to_lowercase),
    }
}

fn host_matches(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .map(|rest| rest.ends_with('.'))
            .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_DESKTOP: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    const EDGE: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0";
    const SAFARI_MAC: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_0) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15";
    const FB_IOS: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Mobile/15E148 [FBAN/FBIOS;FBAV/440.0]";
    const CHROME_IOS: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) CriOS/120.0.0.0 Mobile/15E148 Safari/604.1";
    const IOS_WEBVIEW: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Mobile/15E148";
    const ANDROID_WEBVIEW: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Mobile";

    #[test]
    fn test_user_agent_classification() {
        assert_eq!(Platform::classify(FB_IOS, None), Platform::Facebook);
        assert_eq!(Platform::classify(CHROME_IOS, None), Platform::ChromeIos);
        assert_eq!(Platform::classify(EDGE, None), Platform::Edge);
        assert_eq!(Platform::classify(CHROME_DESKTOP, None), Platform::Chrome);
        assert_eq!(Platform::classify(SAFARI_MAC, None), Platform::Safari);
        assert_eq!(Platform::classify(IOS_WEBVIEW, None), Platform::IosBrowser);
        assert_eq!(
            Platform::classify(ANDROID_WEBVIEW, None),
            Platform::AndroidBrowser
        );
        assert_eq!(
            Platform::classify("Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0", None),
            Platform::Firefox
        );
        assert_eq!(Platform::classify("WhatsApp/2.23.20", None), Platform::WhatsApp);
        assert_eq!(
            Platform::classify("Mozilla/5.0 Instagram 300.0.0", None),
            Platform::Instagram
        );
        assert_eq!(
            Platform::classify("Mozilla/5.0 LinkedInApp", None),
            Platform::LinkedIn
        );
    }

    #[test]
    fn test_fban_anywhere_is_facebook() {
        assert_eq!(Platform::classify("FBAN", None), Platform::Facebook);
        assert_eq!(Platform::classify("xx fban yy", None), Platform::Facebook);
    }

    #[test]
    fn test_empty_is_unknown() {
        assert_eq!(Platform::classify("", None), Platform::Unknown);
        assert_eq!(Platform::classify("", Some("")), Platform::Unknown);
        assert_eq!(Platform::classify("curl/8.0", None), Platform::Unknown);
    }

    #[test]
    fn test_referrer_hosts() {
        assert_eq!(
            Platform::classify("", Some("https://l.facebook.com/l.php?u=x")),
            Platform::Facebook
        );
        assert_eq!(
            Platform::classify("", Some("https://t.co/abc")),
            Platform::Twitter
        );
        assert_eq!(
            Platform::classify("", Some("https://www.linkedin.com/feed")),
            Platform::LinkedIn
        );
        assert_eq!(Platform::classify("", Some("wa.me/123")), Platform::WhatsApp);
        // Substrings of unrelated hosts do not count.
        assert_eq!(
            Platform::classify("", Some("https://www.reddit.com/r/x")),
            Platform::Unknown
        );
    }

    #[test]
    fn test_social_referrer_beats_browser_agent() {
        assert_eq!(
            Platform::classify(CHROME_DESKTOP, Some("https://x.com/someone")),
            Platform::Twitter
        );
    }

    #[test]
    fn test_overrides() {
        assert_eq!(Platform::from_override("fb"), Some(Platform::Facebook));
        assert_eq!(Platform::from_override("IG"), Some(Platform::Instagram));
        assert_eq!(Platform::from_override("x"), Some(Platform::Twitter));
        assert_eq!(Platform::from_override("wa"), Some(Platform::WhatsApp));
        assert_eq!(
            Platform::from_override("Chrome (iOS)"),
            Some(Platform::ChromeIos)
        );
        assert_eq!(Platform::from_override("newsletter"), None);
        assert_eq!(Platform::from_override(" "), None);
    }

    #[test]
    fn test_resolve_prefers_first_known_override() {
        let resolved = Platform::resolve(
            [None, Some("newsletter"), Some("ig"), Some("fb")],
            CHROME_DESKTOP,
            None,
        );
        assert_eq!(resolved, Platform::Instagram);

        let sniffed = Platform::resolve([Some("bogus")], CHROME_DESKTOP, None);
        assert_eq!(sniffed, Platform::Chrome);
    }

    #[test]
    fn test_labels_round_trip_through_storage() {
        for platform in Platform::ALL {
            assert_eq!(Platform::from_label(Some(platform.label())), platform);
        }
        assert_eq!(Platform::from_label(None), Platform::Unknown);
        assert_eq!(Platform::from_label(Some("Myspace")), Platform::Unknown);
    }
}
