// WebSocket feed connector
use crate::application::collaborators::{FeedConnector, FeedStream};
use crate::domain::feed::FeedError;
use async_trait::async_trait;
use futures::StreamExt;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

#[derive(Debug, Clone, Default)]
pub struct WebSocketConnector;

impl WebSocketConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FeedConnector for WebSocketConnector {
    async fn open(&self, url: &str) -> Result<FeedStream, FeedError> {
        let (mut ws, _response) = connect_async(url)
            .await
            .map_err(|e| FeedError::Transport(e.to_string()))?;
        tracing::debug!("Connected to {}", url);

        // Dropping the stream drops the socket, which releases the connection
        let frames = async_stream::stream! {
            while let Some(message) = ws.next().await {
                match message {
                    Ok(Message::Text(text)) => {
                        yield Ok(text);
                    }
                    Ok(Message::Binary(bytes)) => match String::from_utf8(bytes.to_vec()) {
                        Ok(text) => {
                            yield Ok(text);
                        }
                        Err(e) => {
                            yield Err(FeedError::Parse(format!("binary frame is not UTF-8: {}", e)));
                            break;
                        }
                    },
                    Ok(Message::Close(frame)) => {
                        tracing::debug!("Feed closed by server: {:?}", frame);
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        yield Err(FeedError::Transport(e.to_string()));
                        break;
                    }
                }
            }
        };

        Ok(frames.boxed())
    }
}
