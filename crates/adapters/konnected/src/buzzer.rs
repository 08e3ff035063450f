//! The board's buzzer pin as the alarm annunciator.

use std::time::Duration;

use async_trait::async_trait;
use hearth_app::ports::Annunciator;
use hearth_domain::error::BridgeError;

use crate::client::BoardClient;
use crate::protocol::Command;

pub(crate) struct Buzzer {
    client: BoardClient,
    /// Boards without a buzzer zone stay silent.
    pin: Option<u8>,
}

impl Buzzer {
    pub(crate) fn new(client: BoardClient, pin: Option<u8>) -> Self {
        Self { client, pin }
    }

    async fn send(&self, command: impl FnOnce(u8) -> Command) -> Result<(), BridgeError> {
        let Some(pin) = self.pin else {
            tracing::debug!("no buzzer zone configured");
            return Ok(());
        };
        self.client.actuate(&command(pin)).await?;
        Ok(())
    }
}

#[async_trait]
impl Annunciator for Buzzer {
    async fn chirp(&self) -> Result<(), BridgeError> {
        self.send(Command::chirp).await
    }

    async fn intermittent(&self, window: Duration) -> Result<(), BridgeError> {
        let times = u16::try_from(window.as_secs()).unwrap_or(u16::MAX).max(1);
        self.send(|pin| Command::intermittent(pin, times)).await
    }

    async fn ring(&self) -> Result<(), BridgeError> {
        self.send(Command::ring).await
    }

    async fn silence(&self) -> Result<(), BridgeError> {
        self.send(Command::silence).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::pooled;
    use crate::config::KonnectedConfig;
    use crate::fake::FakeBoard;

    #[tokio::test]
    async fn should_beep_once_per_second_of_window() {
        let board = FakeBoard::spawn(&[]).await;
        let client = BoardClient::new(pooled(&KonnectedConfig::default()).unwrap(), &board.address());
        let buzzer = Buzzer::new(client, Some(7));

        buzzer.intermittent(Duration::from_secs(60)).await.unwrap();
        buzzer.ring().await.unwrap();
        buzzer.silence().await.unwrap();

        assert_eq!(
            board.commands(),
            vec![Command::intermittent(7, 60), Command::ring(7), Command::silence(7)]
        );
    }

    #[tokio::test]
    async fn should_stay_silent_without_buzzer_pin() {
        let board = FakeBoard::spawn(&[]).await;
        let client = BoardClient::new(pooled(&KonnectedConfig::default()).unwrap(), &board.address());

        Buzzer::new(client, None).ring().await.unwrap();

        assert!(board.commands().is_empty());
    }
}
