//! A [`PacketLink`] that records traffic instead of transmitting it.

use std::sync::{
    Arc,
    Mutex,
    MutexGuard,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use bleframe::{DeliverError, InboundSink, LinkError, LinkMtu, PacketLink};
use bytes::Bytes;

#[derive(Debug)]
struct State {
    mtu: LinkMtu,
    sent: Mutex<Vec<Bytes>>,
    sink: Mutex<Option<InboundSink>>,
    send_budget: Mutex<Option<usize>>,
    disconnected: AtomicBool,
}

/// Cloneable handle to a recording link.
///
/// Every clone shares the same state, so a test can hand one clone to a
/// [`Peer`](bleframe::Peer) and keep another to inspect outbound packets and
/// inject inbound ones.
#[derive(Clone, Debug)]
pub struct RecordingLink {
    state: Arc<State>,
}

impl RecordingLink {
    /// Create a link enforcing `mtu` on outbound packets.
    #[must_use]
    pub fn new(mtu: LinkMtu) -> Self {
        Self {
            state: Arc::new(State {
                mtu,
                sent: Mutex::new(Vec::new()),
                sink: Mutex::new(None),
                send_budget: Mutex::new(None),
                disconnected: AtomicBool::new(false),
            }),
        }
    }

    /// Packets accepted by [`PacketLink::send_packet`], in send order.
    #[must_use]
    pub fn sent(&self) -> Vec<Bytes> { lock(&self.state.sent).clone() }

    /// Forget previously recorded packets.
    pub fn clear_sent(&self) { lock(&self.state.sent).clear(); }

    /// Accept `packets` more sends, then fail every send after that.
    pub fn fail_after(&self, packets: usize) { *lock(&self.state.send_budget) = Some(packets); }

    /// Whether [`PacketLink::disconnect`] has been called.
    #[must_use]
    pub fn is_disconnected(&self) -> bool { self.state.disconnected.load(Ordering::Acquire) }

    /// Whether a peer has registered its inbound handler.
    #[must_use]
    pub fn is_subscribed(&self) -> bool { lock(&self.state.sink).is_some() }

    /// The inbound handler the peer registered, if any.
    #[must_use]
    pub fn sink(&self) -> Option<InboundSink> { lock(&self.state.sink).clone() }

    /// Push one packet into the subscribed peer, as a notification would.
    ///
    /// # Errors
    ///
    /// Returns whatever the peer's [`InboundSink`] reports, or
    /// [`DeliverError::Closed`] if nothing has subscribed.
    pub async fn inject(&self, packet: &[u8]) -> Result<(), DeliverError> {
        let sink = self.sink().ok_or(DeliverError::Closed)?;
        sink.deliver(packet).await
    }

    /// Inject each packet in turn, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// See [`RecordingLink::inject`].
    pub async fn inject_all<I, P>(&self, packets: I) -> Result<(), DeliverError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[u8]>,
    {
        for packet in packets {
            self.inject(packet.as_ref()).await?;
        }
        Ok(())
    }

    /// Drop the captured sink, signalling the peer that the link went away.
    pub fn drop_sink(&self) { lock(&self.state.sink).take(); }
}

#[async_trait]
impl PacketLink for RecordingLink {
    async fn send_packet(&self, packet: &[u8]) -> Result<(), LinkError> {
        if self.is_disconnected() {
            return Err(LinkError::Disconnected);
        }
        if packet.len() > self.state.mtu.get() {
            return Err(LinkError::PacketTooLarge {
                len: packet.len(),
                mtu: self.state.mtu.get(),
            });
        }
        if let Some(budget) = lock(&self.state.send_budget).as_mut() {
            if *budget == 0 {
                return Err(LinkError::backend("injected send failure"));
            }
            *budget -= 1;
        }
        lock(&self.state.sent).push(Bytes::copy_from_slice(packet));
        Ok(())
    }

    fn subscribe(&self, sink: InboundSink) -> Result<(), LinkError> {
        let mut slot = lock(&self.state.sink);
        if slot.is_some() {
            return Err(LinkError::Subscribe("inbound handler already registered".into()));
        }
        *slot = Some(sink);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), LinkError> {
        self.state.disconnected.store(true, Ordering::Release);
        self.drop_sink();
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}
