/// Decide whether a result's channel belongs to the subscription that was searched.
///
/// Case-insensitive containment in either direction, so "@Handle" matches
/// "Handle Official" and vice versa. Short or generic names can match the wrong
/// channel; the seen-set keeps such a mismatch from repeating, and tightening the
/// rule would start missing genuine uploads from renamed channels.
pub fn channel_matches(subscription: &str, channel: &str) -> bool {
    let subscription = subscription.to_lowercase();
    let channel = channel.to_lowercase();
    subscription.contains(&channel) || channel.contains(&subscription)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substring_either_direction() {
        assert!(channel_matches("BTC News", "BTC News Official"));
        assert!(channel_matches("BTC News Official", "BTC News"));
        assert!(channel_matches("crypto daily", "Crypto Daily Official"));
    }

    #[test]
    fn test_unrelated_channels() {
        assert!(!channel_matches("Foo", "Bar"));
        assert!(!channel_matches("股市分析", "美股頻道"));
    }

    #[test]
    fn test_symmetric() {
        let pairs = [
            ("BTC News", "BTC News Official"),
            ("Foo", "Bar"),
            ("財經M平方", "財經m平方 MacroMicro"),
            ("Handle", "@handle"),
        ];
        for (a, b) in pairs {
            assert_eq!(channel_matches(a, b), channel_matches(b, a), "{} / {}", a, b);
        }
    }
}
