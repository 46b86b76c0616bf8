//! In-process link pair backed by tokio channels.
//!
//! [`MemoryLink::pair`] returns two connected endpoints that honour the
//! packet-link contract: packets are size-checked against the MTU, delivered
//! whole, and arrive in send order. Each endpoint spawns one pump task on
//! subscribe that forwards received packets to the peer's
//! [`InboundSink`](super::InboundSink).
//!
//! Failure injection ([`MemoryLink::fail_after`]) and [`PacketLink::disconnect`]
//! make the endpoints useful for exercising transmit errors and teardown.

use std::sync::{
    Mutex,
    PoisonError,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::{DeliverError, InboundSink, LinkError, PacketLink};
use crate::{fragment::LinkMtu, initiator::Discovery};

/// Packets buffered in each direction before `send_packet` waits.
const LINK_BUFFER: usize = 64;

/// One endpoint of an in-memory link.
#[derive(Debug)]
pub struct MemoryLink {
    mtu: LinkMtu,
    outbound: Mutex<Option<mpsc::Sender<Bytes>>>,
    inbound: Mutex<Option<mpsc::Receiver<Bytes>>>,
    send_budget: Mutex<Option<usize>>,
    subscribed: AtomicBool,
    shutdown: CancellationToken,
}

impl MemoryLink {
    /// Create two connected endpoints sharing `mtu`.
    #[must_use]
    pub fn pair(mtu: LinkMtu) -> (Self, Self) {
        let (a_tx, b_rx) = mpsc::channel(LINK_BUFFER);
        let (b_tx, a_rx) = mpsc::channel(LINK_BUFFER);
        (Self::new(mtu, a_tx, a_rx), Self::new(mtu, b_tx, b_rx))
    }

    fn new(mtu: LinkMtu, outbound: mpsc::Sender<Bytes>, inbound: mpsc::Receiver<Bytes>) -> Self {
        Self {
            mtu,
            outbound: Mutex::new(Some(outbound)),
            inbound: Mutex::new(Some(inbound)),
            send_budget: Mutex::new(None),
            subscribed: AtomicBool::new(false),
            shutdown: CancellationToken::new(),
        }
    }

    /// Return the MTU enforced by this endpoint.
    #[must_use]
    pub fn mtu(&self) -> LinkMtu { self.mtu }

    /// Allow `packets` more successful sends, then fail every later send.
    pub fn fail_after(&self, packets: usize) {
        *self.send_budget.lock().unwrap_or_else(PoisonError::into_inner) = Some(packets);
    }

    /// Report whether [`PacketLink::disconnect`] has been called.
    #[must_use]
    pub fn is_disconnected(&self) -> bool { self.shutdown.is_cancelled() }

    fn take_send_slot(&self) -> Result<(), LinkError> {
        let mut budget = self
            .send_budget
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match budget.as_mut() {
            None => Ok(()),
            Some(0) => Err(LinkError::backend("injected send failure")),
            Some(remaining) => {
                *remaining -= 1;
                Ok(())
            }
        }
    }

    fn sender(&self) -> Result<mpsc::Sender<Bytes>, LinkError> {
        self.outbound
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(LinkError::Disconnected)
    }
}

#[async_trait]
impl PacketLink for MemoryLink {
    async fn send_packet(&self, packet: &[u8]) -> Result<(), LinkError> {
        if packet.len() > self.mtu.get() {
            return Err(LinkError::PacketTooLarge {
                len: packet.len(),
                mtu: self.mtu.get(),
            });
        }
        let sender = self.sender()?;
        self.take_send_slot()?;
        trace!(len = packet.len(), "memory link send");
        sender
            .send(Bytes::copy_from_slice(packet))
            .await
            .map_err(|_| LinkError::Disconnected)
    }

    fn subscribe(&self, sink: InboundSink) -> Result<(), LinkError> {
        if self.subscribed.swap(true, Ordering::AcqRel) {
            return Err(LinkError::Subscribe("inbound handler already registered".into()));
        }
        let inbound = self
            .inbound
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(LinkError::Disconnected)?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|err| LinkError::Subscribe(err.to_string()))?;
        runtime.spawn(pump(inbound, sink, self.shutdown.clone()));
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), LinkError> {
        self.outbound
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.shutdown.cancel();
        debug!("memory link disconnected");
        Ok(())
    }
}

impl Drop for MemoryLink {
    fn drop(&mut self) { self.shutdown.cancel(); }
}

/// Forward packets from the channel to the sink until either side goes away.
async fn pump(mut inbound: mpsc::Receiver<Bytes>, sink: InboundSink, shutdown: CancellationToken) {
    loop {
        let packet = tokio::select! {
            biased;
            () = shutdown.cancelled() => break,
            packet = inbound.recv() => match packet {
                Some(packet) => packet,
                None => break,
            },
        };
        let delivered = tokio::select! {
            biased;
            () = shutdown.cancelled() => break,
            delivered = sink.deliver(&packet) => delivered,
        };
        match delivered {
            Ok(()) => {}
            Err(DeliverError::Closed) => break,
            Err(DeliverError::Fragment(err)) => {
                warn!(error = %err, "memory link dropped malformed packet");
            }
        }
    }
    debug!("memory link pump stopped");
}

/// Discovery stand-in that yields a pre-connected [`MemoryLink`] once.
#[derive(Debug)]
pub struct MemoryDiscovery {
    link: Option<MemoryLink>,
}

impl MemoryDiscovery {
    /// Wrap a link that discovery will hand out.
    #[must_use]
    pub fn new(link: MemoryLink) -> Self { Self { link: Some(link) } }
}

#[async_trait]
impl Discovery for MemoryDiscovery {
    type Link = MemoryLink;

    async fn discover(&mut self) -> Result<Self::Link, LinkError> {
        self.link.take().ok_or(LinkError::Disconnected)
    }
}
