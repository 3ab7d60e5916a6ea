use anyhow::{Context, Result};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{Atom, AtomEnum, ConnectionExt, Window};
use x11rb::rust_connection::RustConnection;

use super::{PointerProbe, WindowProbe};

fn intern_atom(conn: &RustConnection, name: &str) -> Result<Atom> {
    let reply = conn
        .intern_atom(false, name.as_bytes())
        .with_context(|| format!("failed to intern atom {name}"))?
        .reply()
        .with_context(|| format!("no reply interning atom {name}"))?;
    Ok(reply.atom)
}

/// Focused-window titles via the EWMH properties on the root window.
pub struct X11WindowProbe {
    conn: RustConnection,
    root: Window,
    net_active_window: Atom,
    net_wm_name: Atom,
}

impl X11WindowProbe {
    pub fn new() -> Result<Self> {
        let (conn, screen_num) =
            x11rb::connect(None).context("failed to connect to X server")?;
        let root = conn.setup().roots[screen_num].root;
        let net_active_window = intern_atom(&conn, "_NET_ACTIVE_WINDOW")?;
        let net_wm_name = intern_atom(&conn, "_NET_WM_NAME")?;

        Ok(Self {
            conn,
            root,
            net_active_window,
            net_wm_name,
        })
    }

    fn active_window_id(&self) -> Result<Option<Window>> {
        let reply = self
            .conn
            .get_property(
                false,
                self.root,
                self.net_active_window,
                AtomEnum::WINDOW,
                0,
                1,
            )
            .context("failed to query _NET_ACTIVE_WINDOW")?
            .reply()
            .context("no reply for _NET_ACTIVE_WINDOW")?;

        let window = reply.value32().and_then(|mut values| values.next());
        // The WM sets the property to 0 when focus is nowhere.
        Ok(window.filter(|&id| id != 0))
    }

    fn window_title(&self, window: Window) -> Result<Option<String>> {
        // Prefer the UTF-8 EWMH name, fall back to the legacy WM_NAME.
        for atom in [self.net_wm_name, AtomEnum::WM_NAME.into()] {
            let reply = self
                .conn
                .get_property(false, window, atom, AtomEnum::ANY, 0, 1024)
                .context("failed to query window name")?
                .reply()
                .context("no reply for window name")?;

            if !reply.value.is_empty() {
                return Ok(Some(String::from_utf8_lossy(&reply.value).into_owned()));
            }
        }

        Ok(None)
    }
}

impl WindowProbe for X11WindowProbe {
    fn focused_window(&self) -> Result<Option<String>> {
        let Some(window) = self.active_window_id()? else {
            return Ok(None);
        };
        self.window_title(window)
    }
}

/// Pointer coordinates relative to the root window, read over the same
/// protocol connection type as the window probe.
pub struct X11PointerProbe {
    conn: RustConnection,
    root: Window,
}

impl X11PointerProbe {
    pub fn new() -> Result<Self> {
        let (conn, screen_num) =
            x11rb::connect(None).context("failed to connect to X server")?;
        let root = conn.setup().roots[screen_num].root;

        Ok(Self { conn, root })
    }
}

impl PointerProbe for X11PointerProbe {
    fn position(&self) -> Result<(i32, i32)> {
        let reply = self
            .conn
            .query_pointer(self.root)
            .context("failed to query pointer")?
            .reply()
            .context("no reply for pointer query")?;

        Ok((i32::from(reply.root_x), i32::from(reply.root_y)))
    }
}
