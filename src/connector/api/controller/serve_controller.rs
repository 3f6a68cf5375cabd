use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use anyhow::Result;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::connector::server;

use super::super::Container;

pub struct ServeController<'a> {
    container: &'a Container,
}

impl<'a> ServeController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn serve(&self, port: u16, public: bool) -> Result<String> {
        let ip = if public {
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        } else {
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        };
        let listener = TcpListener::bind(SocketAddr::new(ip, port)).await?;

        let shutdown = CancellationToken::new();
        let on_signal = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl-C: {}", e);
                return;
            }
            info!("Shutting down chat endpoint");
            on_signal.cancel();
        });

        server::serve(listener, self.container.gateway(), shutdown).await?;

        Ok("Chat endpoint stopped.".to_string())
    }
}
