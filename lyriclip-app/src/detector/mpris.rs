//! MPRIS playback detection over the D-Bus session bus.

use async_trait::async_trait;
use lyriclip_core::{CoreError, PlaybackDetector, PlaybackSample, Result, SongIdentity};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};
use zbus::fdo::{DBusProxy, PropertiesProxy};
use zbus::names::InterfaceName;
use zbus::zvariant::{OwnedValue, Value};
use zbus::Connection;

const MPRIS_PREFIX: &str = "org.mpris.MediaPlayer2.";
const MPRIS_PATH: &str = "/org/mpris/MediaPlayer2";
const PLAYER_INTERFACE: &str = "org.mpris.MediaPlayer2.Player";

/// Walks every `org.mpris.MediaPlayer2.*` service and reports the first one playing
pub struct MprisDetector {
    connection: Connection,
}

impl MprisDetector {
    /// Connect to the session bus.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DetectorUnavailable`] if the session bus cannot be reached.
    pub async fn connect() -> Result<Self> {
        let connection =
            Connection::session()
                .await
                .map_err(|e| CoreError::DetectorUnavailable {
                    reason: format!("cannot connect to D-Bus session bus: {e}"),
                })?;
        info!("Using D-Bus MPRIS for playback detection");
        Ok(Self { connection })
    }

    async fn player_names(&self) -> zbus::Result<Vec<String>> {
        let names = DBusProxy::new(&self.connection).await?.list_names().await?;
        Ok(mpris_players(names.iter().map(|name| name.as_str())))
    }

    async fn read_player(&self, name: &str) -> zbus::Result<PlayerState> {
        let proxy = PropertiesProxy::builder(&self.connection)
            .destination(name)?
            .path(MPRIS_PATH)?
            .build()
            .await?;
        let interface = || InterfaceName::from_static_str_unchecked(PLAYER_INTERFACE);

        let status = String::try_from(proxy.get(interface(), "PlaybackStatus").await?)?;
        if status != "Playing" {
            return Ok(PlayerState {
                status,
                ..PlayerState::default()
            });
        }

        let mut metadata =
            HashMap::<String, OwnedValue>::try_from(proxy.get(interface(), "Metadata").await?)?;
        let title = metadata
            .remove("xesam:title")
            .and_then(|value| String::try_from(value).ok());
        let artists = metadata
            .get("xesam:artist")
            .map(|value| artists_from(value))
            .unwrap_or_default();

        // Some players do not implement Position; treat it as the start of the song
        let position = match proxy.get(interface(), "Position").await {
            Ok(value) => i64::try_from(value).ok(),
            Err(e) => {
                debug!("{} has no position: {}", name, e);
                None
            }
        };

        Ok(PlayerState {
            status,
            title,
            artists,
            position_micros: position,
        })
    }

    fn failure(reason: impl Into<String>) -> CoreError {
        CoreError::DetectorFailed {
            detector: "mpris".to_string(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl PlaybackDetector for MprisDetector {
    fn name(&self) -> &'static str {
        "mpris"
    }

    async fn sample(&self) -> Result<PlaybackSample> {
        let players = self
            .player_names()
            .await
            .map_err(|e| Self::failure(format!("cannot list bus names: {e}")))?;

        for player in &players {
            match self.read_player(player).await {
                Ok(state) => match state.into_sample() {
                    Ok(sample) => return Ok(sample),
                    Err(e) => debug!("Skipping {}: {}", player, e),
                },
                Err(e) => debug!("Failed to read {}: {}", player, e),
            }
        }

        Err(CoreError::NoActivePlayback)
    }
}

/// Properties read from one player's `org.mpris.MediaPlayer2.Player` interface
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct PlayerState {
    status: String,
    title: Option<String>,
    artists: Vec<String>,
    position_micros: Option<i64>,
}

impl PlayerState {
    fn into_sample(self) -> Result<PlaybackSample> {
        if self.status != "Playing" {
            return Err(CoreError::NoActivePlayback);
        }

        let title = self.title.filter(|t| !t.trim().is_empty());
        let artist = self.artists.into_iter().find(|a| !a.trim().is_empty());
        let (Some(artist), Some(title)) = (artist, title) else {
            return Err(MprisDetector::failure("incomplete song information"));
        };

        let micros = self
            .position_micros
            .and_then(|p| u64::try_from(p).ok())
            .unwrap_or(0);

        Ok(PlaybackSample::playing(
            SongIdentity::new(artist.trim(), title.trim()),
            Duration::from_micros(micros),
        ))
    }
}

/// MPRIS services among `names`, in a stable order
fn mpris_players<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut players: Vec<String> = names
        .filter(|name| name.starts_with(MPRIS_PREFIX))
        .map(str::to_string)
        .collect();
    players.sort();
    players
}

/// `xesam:artist` is a string list, though some players send a single string
fn artists_from(value: &Value<'_>) -> Vec<String> {
    match value {
        Value::Str(artist) => vec![artist.as_str().to_string()],
        Value::Array(artists) => artists
            .iter()
            .filter_map(|artist| match artist {
                Value::Str(artist) => Some(artist.as_str().to_string()),
                _ => None,
            })
            .collect(),
        Value::Value(inner) => artists_from(inner),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing(artists: &[&str], title: Option<&str>, position: Option<i64>) -> PlayerState {
        PlayerState {
            status: "Playing".to_string(),
            title: title.map(str::to_string),
            artists: artists.iter().map(|a| (*a).to_string()).collect(),
            position_micros: position,
        }
    }

    #[test]
    fn test_parse_playing() {
        let sample = playing(
            &["Rick Astley"],
            Some("Never Gonna Give You Up"),
            Some(18_810_000),
        )
        .into_sample()
        .unwrap();

        assert!(sample.is_playing);
        assert_eq!(
            sample.identity,
            SongIdentity::new("Rick Astley", "Never Gonna Give You Up")
        );
        assert_eq!(sample.position, Duration::from_millis(18_810));
    }

    #[test]
    fn test_first_named_artist_used() {
        let sample = playing(&["", "Queen", "David Bowie"], Some("Under Pressure"), Some(0))
            .into_sample()
            .unwrap();
        assert_eq!(sample.identity.artist, "Queen");
    }

    #[test]
    fn test_missing_position_starts_at_zero() {
        let sample = playing(&["Artist"], Some("Title"), None).into_sample().unwrap();
        assert_eq!(sample.position, Duration::ZERO);

        let negative = playing(&["Artist"], Some("Title"), Some(-5)).into_sample().unwrap();
        assert_eq!(negative.position, Duration::ZERO);
    }

    #[test]
    fn test_paused_is_no_playback() {
        let state = PlayerState {
            status: "Paused".to_string(),
            ..playing(&["Artist"], Some("Title"), Some(1))
        };
        assert!(matches!(state.into_sample(), Err(CoreError::NoActivePlayback)));
    }

    #[test]
    fn test_incomplete_metadata_is_failure() {
        let err = playing(&[], Some("Title"), None).into_sample().unwrap_err();
        assert!(matches!(err, CoreError::DetectorFailed { .. }));

        let err = playing(&["Artist"], Some("  "), None).into_sample().unwrap_err();
        assert!(err.is_detection_failure());
    }

    #[test]
    fn test_only_mpris_services_listed() {
        let names = [
            "org.freedesktop.DBus",
            "org.mpris.MediaPlayer2.vlc",
            ":1.42",
            "org.mpris.MediaPlayer2.spotify",
            "org.mpris.MediaPlayer2",
        ];
        assert_eq!(
            mpris_players(names.into_iter()),
            vec![
                "org.mpris.MediaPlayer2.spotify".to_string(),
                "org.mpris.MediaPlayer2.vlc".to_string(),
            ]
        );
    }

    #[test]
    fn test_artists_from_values() {
        assert_eq!(
            artists_from(&Value::from(vec!["Queen", "David Bowie"])),
            vec!["Queen".to_string(), "David Bowie".to_string()]
        );
        assert_eq!(artists_from(&Value::from("Queen")), vec!["Queen".to_string()]);
        assert!(artists_from(&Value::from(42_i64)).is_empty());
    }
}
