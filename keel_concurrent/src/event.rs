/// Unbounded multi-producer channel for fire-and-forget events
pub fn event_send<T: Send + 'static>() -> (EventSender<T>, EventReceiver<T>) {
    let (send, recv) = crossbeam_channel::unbounded();
    (EventSender::new(send), EventReceiver::new(recv))
}

#[derive(Debug)]
pub struct EventSender<T: Send + 'static> {
    send: crossbeam_channel::Sender<T>,
}

impl<T: Send + 'static> Clone for EventSender<T> {
    fn clone(&self) -> Self {
        Self {
            send: self.send.clone(),
        }
    }
}

impl<T: Send + 'static> EventSender<T> {
    pub fn new(send: crossbeam_channel::Sender<T>) -> Self {
        Self { send }
    }

    pub fn send(&self, event: T) -> Result<(), crossbeam_channel::SendError<T>> {
        self.send.send(event)
    }
}

#[derive(Debug)]
pub struct EventReceiver<T: Send + 'static> {
    recv: crossbeam_channel::Receiver<T>,
}

impl<T: Send + 'static> EventReceiver<T> {
    pub fn new(recv: crossbeam_channel::Receiver<T>) -> Self {
        Self { recv }
    }

    /// Everything received so far, without blocking
    pub fn drain(&self) -> Vec<T> {
        self.recv.try_iter().collect()
    }

    pub fn recv_timeout(&self, timeout: std::time::Duration) -> Option<T> {
        self.recv.recv_timeout(timeout).ok()
    }
}

impl<T: Send + 'static> Iterator for EventReceiver<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.recv.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_arrive_in_order() {
        let (send, recv) = event_send();
        let other = send.clone();
        send.send(1).unwrap();
        other.send(2).unwrap();
        send.send(3).unwrap();
        assert_eq!(recv.drain(), vec![1, 2, 3]);
        assert!(recv.drain().is_empty());
    }
}
