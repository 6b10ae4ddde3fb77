//! NSE trading-session clock. Pure wall-clock arithmetic, no I/O.

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use chrono_tz::Tz;

use crate::models::MarketSession;

const MARKET_TZ: Tz = chrono_tz::Asia::Kolkata;

const OPEN_MINUTES: u32 = 9 * 60 + 15;
const CLOSE_MINUTES: u32 = 15 * 60 + 30;

/// Current session status in the market's timezone.
pub fn market_session() -> MarketSession {
    session_at(Utc::now().with_timezone(&MARKET_TZ))
}

/// Session status at an arbitrary instant. Factored out so tests can
/// inject fixed times.
pub fn session_at(now: DateTime<Tz>) -> MarketSession {
    if matches!(now.weekday(), Weekday::Sat | Weekday::Sun) {
        return MarketSession {
            is_open: false,
            status_text: "Closed (Weekend)".to_string(),
        };
    }

    let minutes = now.hour() * 60 + now.minute();
    if (OPEN_MINUTES..=CLOSE_MINUTES).contains(&minutes) {
        MarketSession {
            is_open: true,
            status_text: "Open".to_string(),
        }
    } else if minutes < OPEN_MINUTES {
        MarketSession {
            is_open: false,
            status_text: "Closed (Opens at 9:15 AM)".to_string(),
        }
    } else {
        MarketSession {
            is_open: false,
            status_text: "Closed (Opens Tomorrow 9:15 AM)".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ist(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Tz> {
        MARKET_TZ.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_weekday_mid_session_is_open() {
        // 2024-06-05 is a Wednesday.
        let session = session_at(ist(2024, 6, 5, 11, 0));
        assert!(session.is_open);
        assert_eq!(session.status_text, "Open");
    }

    #[test]
    fn test_open_and_close_minutes_inclusive() {
        assert!(session_at(ist(2024, 6, 5, 9, 15)).is_open);
        assert!(session_at(ist(2024, 6, 5, 15, 30)).is_open);
        assert!(!session_at(ist(2024, 6, 5, 9, 14)).is_open);
        assert!(!session_at(ist(2024, 6, 5, 15, 31)).is_open);
    }

    #[test]
    fn test_weekend_closed() {
        // 2024-06-08 is a Saturday.
        let session = session_at(ist(2024, 6, 8, 11, 0));
        assert!(!session.is_open);
        assert_eq!(session.status_text, "Closed (Weekend)");
    }

    #[test]
    fn test_pre_open_and_post_close_messages() {
        let pre = session_at(ist(2024, 6, 5, 8, 0));
        assert_eq!(pre.status_text, "Closed (Opens at 9:15 AM)");

        let post = session_at(ist(2024, 6, 5, 18, 0));
        assert_eq!(post.status_text, "Closed (Opens Tomorrow 9:15 AM)");
    }
}
