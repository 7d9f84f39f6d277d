use crate::{atoms::*, model::*, transport::*, NetwmError, NetwmResult};

/// NetConnection owns the transport together with its protocol atom table.
///
/// Share it behind an `Arc` between the `RootInfo` and the `WinInfo`s built on top of it; the
/// atoms are interned once no matter how many of them exist.
#[derive(Debug)]
pub struct NetConnection<T: Transport> {
    transport: T,
    registry: AtomRegistry,
}

impl<T: Transport> NetConnection<T> {
    pub fn new(transport: T) -> Self {
        Self { transport, registry: AtomRegistry::new() }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Protocol atoms, interned on first use
    pub fn atoms(&self) -> NetwmResult<&AtomCollection> {
        self.registry.intern_all(&self.transport)
    }

    /// Screen number resolved against the connection default
    pub fn screen(&self, screen: Option<usize>) -> NetwmResult<(usize, ScreenInfo)> {
        let screen = screen.unwrap_or_else(|| self.transport.default_screen());
        let info = self.transport.screen(screen).ok_or(NetwmError::NoSuchScreen(screen))?;
        Ok((screen, info))
    }

    pub fn root(&self, screen: Option<usize>) -> NetwmResult<Window> {
        Ok(self.screen(screen)?.1.root)
    }
}
