// Canonical topic catalog for bot remote control.
// Every address is `{namespace}/{instance_id}` followed by one fixed suffix.
// Bot-side listeners bind these exact strings, so changing one is a wire break.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_NAMESPACE: &str = "hbot";

// -----------------------------------------------------------------------------
// COMMANDS (request/response)
// -----------------------------------------------------------------------------

pub const CMD_START: &str = "/start";
pub const CMD_STOP: &str = "/stop";
pub const CMD_IMPORT: &str = "/import";
pub const CMD_CONFIG: &str = "/config";
pub const CMD_STATUS: &str = "/status";
pub const CMD_HISTORY: &str = "/history";
pub const CMD_BALANCE_LIMIT: &str = "/balance/limit";
pub const CMD_BALANCE_PAPER: &str = "/balance/paper";
pub const CMD_COMMAND_SHORTCUT: &str = "/command_shortcuts";
pub const CMD_EXCHANGE_INFO: &str = "/exchange_info";
pub const CMD_USER_DIRECTED_TRADE: &str = "/user_directed/trade";
pub const CMD_USER_DIRECTED_CANCEL: &str = "/user_directed/cancel";
pub const CMD_USER_DIRECTED_LIST_ACTIVE_ORDERS: &str = "/user_directed/list_active_orders";

// -----------------------------------------------------------------------------
// BROADCAST CHANNELS (bot -> controller)
// -----------------------------------------------------------------------------

pub const CH_LOG: &str = "/log";
pub const CH_EVENTS: &str = "/events";
pub const CH_NOTIFY: &str = "/notify";
pub const CH_HEARTBEAT: &str = "/hb";
pub const CH_EXTERNAL_EVENT_PREFIX: &str = "/external/event";
pub const CH_EXTERNAL_EVENT_WILDCARD: &str = "/external/event/*";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
// Exchange round trip for order placement
pub const TRADE_TIMEOUT: Duration = Duration::from_secs(20);

/// `{namespace}/{instance_id}`
pub fn topic_prefix(namespace: &str, instance_id: &str) -> String {
    format!("{}/{}", namespace, instance_id)
}

/// Full transport address of `command` for one bot instance.
pub fn topic_address(namespace: &str, instance_id: &str, command: Command) -> String {
    format!("{}{}", topic_prefix(namespace, instance_id), command.suffix())
}

/// NATS subject carrying `address`. Each `/` level becomes a `.` token so a
/// trailing `*` (see `CH_EXTERNAL_EVENT_WILDCARD`) matches exactly one level.
/// Namespace and instance ids must not contain `.` themselves.
pub fn nats_subject(address: &str) -> String {
    address.replace('/', ".")
}

/// The closed set of remote commands a bot instance answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Command {
    Start,
    Stop,
    Import,
    Config,
    Status,
    History,
    BalanceLimit,
    BalancePaper,
    CommandShortcut,
    ExchangeInfo,
    UserDirectedTrade,
    UserDirectedCancel,
    UserDirectedListActiveOrders,
}

impl Command {
    /// Declaration order; `index()` is the position in this array.
    pub const ALL: [Command; 13] = [
        Command::Start,
        Command::Stop,
        Command::Import,
        Command::Config,
        Command::Status,
        Command::History,
        Command::BalanceLimit,
        Command::BalancePaper,
        Command::CommandShortcut,
        Command::ExchangeInfo,
        Command::UserDirectedTrade,
        Command::UserDirectedCancel,
        Command::UserDirectedListActiveOrders,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn suffix(self) -> &'static str {
        match self {
            Command::Start => CMD_START,
            Command::Stop => CMD_STOP,
            Command::Import => CMD_IMPORT,
            Command::Config => CMD_CONFIG,
            Command::Status => CMD_STATUS,
            Command::History => CMD_HISTORY,
            Command::BalanceLimit => CMD_BALANCE_LIMIT,
            Command::BalancePaper => CMD_BALANCE_PAPER,
            Command::CommandShortcut => CMD_COMMAND_SHORTCUT,
            Command::ExchangeInfo => CMD_EXCHANGE_INFO,
            Command::UserDirectedTrade => CMD_USER_DIRECTED_TRADE,
            Command::UserDirectedCancel => CMD_USER_DIRECTED_CANCEL,
            Command::UserDirectedListActiveOrders => CMD_USER_DIRECTED_LIST_ACTIVE_ORDERS,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Stop => "stop",
            Command::Import => "import",
            Command::Config => "config",
            Command::Status => "status",
            Command::History => "history",
            Command::BalanceLimit => "balance_limit",
            Command::BalancePaper => "balance_paper",
            Command::CommandShortcut => "command_shortcut",
            Command::ExchangeInfo => "exchange_info",
            Command::UserDirectedTrade => "user_directed_trade",
            Command::UserDirectedCancel => "user_directed_cancel",
            Command::UserDirectedListActiveOrders => "user_directed_list_active_orders",
        }
    }

    pub fn from_suffix(suffix: &str) -> Option<Command> {
        Command::ALL.into_iter().find(|c| c.suffix() == suffix)
    }

    /// Reverse of `topic_address` for a known prefix.
    pub fn from_address(prefix: &str, address: &str) -> Option<Command> {
        address.strip_prefix(prefix).and_then(Command::from_suffix)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown command '{0}'")]
pub struct UnknownCommand(pub String);

impl FromStr for Command {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| UnknownCommand(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const RESERVED: [&str; 5] = [CH_LOG, CH_EVENTS, CH_NOTIFY, CH_HEARTBEAT, CH_EXTERNAL_EVENT_WILDCARD];

    #[test]
    fn test_address_format() {
        assert_eq!(topic_address("hbot", "bot1", Command::Start), "hbot/bot1/start");
        assert_eq!(
            topic_address("hbot", "bot1", Command::BalanceLimit),
            "hbot/bot1/balance/limit"
        );
        assert_eq!(
            topic_address("prod", "mm-7", Command::UserDirectedListActiveOrders),
            "prod/mm-7/user_directed/list_active_orders"
        );
        assert_eq!(
            topic_address("hbot", "x", Command::CommandShortcut),
            "hbot/x/command_shortcuts"
        );
    }

    #[test]
    fn test_address_is_deterministic() {
        for cmd in Command::ALL {
            assert_eq!(topic_address("ns", "id", cmd), topic_address("ns", "id", cmd));
        }
    }

    #[test]
    fn test_addresses_are_injective() {
        let addresses: HashSet<String> = Command::ALL
            .iter()
            .map(|c| topic_address("hbot", "bot1", *c))
            .collect();
        assert_eq!(addresses.len(), Command::ALL.len());
    }

    #[test]
    fn test_commands_do_not_collide_with_channels() {
        for cmd in Command::ALL {
            assert!(!RESERVED.contains(&cmd.suffix()), "{} collides", cmd);
            assert!(!cmd.suffix().starts_with(CH_EXTERNAL_EVENT_PREFIX));
        }
    }

    #[test]
    fn test_nats_subject_tokens() {
        assert_eq!(
            nats_subject(&topic_address("hbot", "bot1", Command::BalanceLimit)),
            "hbot.bot1.balance.limit"
        );

        // `*` only acts as a wildcard when it is a whole token
        let wildcard = nats_subject(&format!("{}{}", topic_prefix("hbot", "bot1"), CH_EXTERNAL_EVENT_WILDCARD));
        assert_eq!(wildcard, "hbot.bot1.external.event.*");
        let published = nats_subject(&format!("{}{}/signal", topic_prefix("hbot", "bot1"), CH_EXTERNAL_EVENT_PREFIX));
        let pattern: Vec<&str> = wildcard.split('.').collect();
        let tokens: Vec<&str> = published.split('.').collect();
        assert_eq!(pattern.len(), tokens.len());
        assert!(pattern.iter().zip(&tokens).all(|(p, t)| *p == "*" || p == t));
    }

    #[test]
    fn test_index_matches_all_order() {
        for (i, cmd) in Command::ALL.iter().enumerate() {
            assert_eq!(cmd.index(), i);
        }
    }

    #[test]
    fn test_reverse_lookup() {
        let prefix = topic_prefix("hbot", "bot1");
        for cmd in Command::ALL {
            let address = topic_address("hbot", "bot1", cmd);
            assert_eq!(Command::from_address(&prefix, &address), Some(cmd));
        }
        assert_eq!(Command::from_address(&prefix, "hbot/bot2/start"), None);
        assert_eq!(Command::from_address(&prefix, "hbot/bot1/log"), None);
    }

    #[test]
    fn test_name_roundtrip() {
        for cmd in Command::ALL {
            assert_eq!(cmd.name().parse::<Command>(), Ok(cmd));
        }
        assert!("launch".parse::<Command>().is_err());
    }
}
