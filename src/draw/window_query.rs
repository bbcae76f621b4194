use crate::draw::geometry::WindowGeometry;
use anyhow::{anyhow, Result};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub u64);

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapState {
    Viewable,
    /// Mapped, but an ancestor is not.
    Unviewable,
    /// Withdrawn or minimized.
    Unmapped,
}

/// Access to the windows of other applications.
pub trait WindowQuery {
    fn find_by_exact_name(&mut self, name: &str) -> Result<Option<WindowHandle>>;
    fn find_by_prefix(&mut self, prefix: &str) -> Result<Option<WindowHandle>>;
    fn find_by_suffix(&mut self, suffix: &str) -> Result<Option<WindowHandle>>;
    fn map_state(&mut self, handle: WindowHandle) -> Result<MapState>;
    /// Client area size.
    fn size(&mut self, handle: WindowHandle) -> Result<(i32, i32)>;
    /// Root-window (screen) coordinates of the client area origin.
    fn translate_to_root(&mut self, handle: WindowHandle) -> Result<(i32, i32)>;
}

/// Window title pattern: `*suffix`, `prefix*`, or an exact title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamePattern {
    Exact(String),
    Prefix(String),
    Suffix(String),
}

impl NamePattern {
    pub fn parse(raw: &str) -> Self {
        if let Some(suffix) = raw.strip_prefix('*') {
            NamePattern::Suffix(suffix.to_string())
        } else if let Some(prefix) = raw.strip_suffix('*') {
            NamePattern::Prefix(prefix.to_string())
        } else {
            NamePattern::Exact(raw.to_string())
        }
    }

    pub fn matches(&self, title: &str) -> bool {
        match self {
            NamePattern::Exact(name) => title == name,
            NamePattern::Prefix(prefix) => title.starts_with(prefix.as_str()),
            NamePattern::Suffix(suffix) => title.ends_with(suffix.as_str()),
        }
    }

    pub fn lookup(&self, query: &mut dyn WindowQuery) -> Result<Option<WindowHandle>> {
        match self {
            NamePattern::Exact(name) => query.find_by_exact_name(name),
            NamePattern::Prefix(prefix) => query.find_by_prefix(prefix),
            NamePattern::Suffix(suffix) => query.find_by_suffix(suffix),
        }
    }
}

impl fmt::Display for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamePattern::Exact(name) => f.write_str(name),
            NamePattern::Prefix(prefix) => write!(f, "{prefix}*"),
            NamePattern::Suffix(suffix) => write!(f, "*{suffix}"),
        }
    }
}

/// First window in `windows` whose title matches `pattern`.
pub fn first_match<'a, I>(windows: I, pattern: &NamePattern) -> Option<WindowHandle>
where
    I: IntoIterator<Item = &'a (WindowHandle, String)>,
{
    windows
        .into_iter()
        .find(|(_, title)| pattern.matches(title))
        .map(|(handle, _)| *handle)
}

/// Backend for platforms without a window query implementation.
#[derive(Debug, Default)]
pub struct NullWindowQuery;

impl WindowQuery for NullWindowQuery {
    fn find_by_exact_name(&mut self, _name: &str) -> Result<Option<WindowHandle>> {
        Ok(None)
    }

    fn find_by_prefix(&mut self, _prefix: &str) -> Result<Option<WindowHandle>> {
        Ok(None)
    }

    fn find_by_suffix(&mut self, _suffix: &str) -> Result<Option<WindowHandle>> {
        Ok(None)
    }

    fn map_state(&mut self, handle: WindowHandle) -> Result<MapState> {
        Err(anyhow!("window {handle} cannot be queried on this platform"))
    }

    fn size(&mut self, handle: WindowHandle) -> Result<(i32, i32)> {
        Err(anyhow!("window {handle} cannot be queried on this platform"))
    }

    fn translate_to_root(&mut self, handle: WindowHandle) -> Result<(i32, i32)> {
        Err(anyhow!("window {handle} cannot be queried on this platform"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticWindow {
    pub handle: WindowHandle,
    pub title: String,
    pub geometry: WindowGeometry,
    pub map_state: MapState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    Exact,
    Prefix,
    Suffix,
}

/// In-memory window table. Records which lookups were made and can be told
/// to fail, which makes it a stand-in window system for tests and demos.
#[derive(Debug, Default)]
pub struct StaticWindowQuery {
    pub windows: Vec<StaticWindow>,
    pub lookups: Vec<LookupKind>,
    pub fail_queries: bool,
}

impl StaticWindowQuery {
    pub fn with_windows(windows: Vec<StaticWindow>) -> Self {
        Self {
            windows,
            ..Self::default()
        }
    }

    fn find(&mut self, kind: LookupKind, pattern: NamePattern) -> Result<Option<WindowHandle>> {
        self.lookups.push(kind);
        if self.fail_queries {
            return Err(anyhow!("window system unavailable"));
        }
        let table: Vec<_> = self
            .windows
            .iter()
            .map(|window| (window.handle, window.title.clone()))
            .collect();
        Ok(first_match(&table, &pattern))
    }

    fn window(&self, handle: WindowHandle) -> Result<&StaticWindow> {
        if self.fail_queries {
            return Err(anyhow!("window system unavailable"));
        }
        self.windows
            .iter()
            .find(|window| window.handle == handle)
            .ok_or_else(|| anyhow!("bad window {handle}"))
    }
}

impl WindowQuery for StaticWindowQuery {
    fn find_by_exact_name(&mut self, name: &str) -> Result<Option<WindowHandle>> {
        self.find(LookupKind::Exact, NamePattern::Exact(name.to_string()))
    }

    fn find_by_prefix(&mut self, prefix: &str) -> Result<Option<WindowHandle>> {
        self.find(LookupKind::Prefix, NamePattern::Prefix(prefix.to_string()))
    }

    fn find_by_suffix(&mut self, suffix: &str) -> Result<Option<WindowHandle>> {
        self.find(LookupKind::Suffix, NamePattern::Suffix(suffix.to_string()))
    }

    fn map_state(&mut self, handle: WindowHandle) -> Result<MapState> {
        Ok(self.window(handle)?.map_state)
    }

    fn size(&mut self, handle: WindowHandle) -> Result<(i32, i32)> {
        Ok(self.window(handle)?.geometry.size())
    }

    fn translate_to_root(&mut self, handle: WindowHandle) -> Result<(i32, i32)> {
        Ok(self.window(handle)?.geometry.position())
    }
}

/// Window query for the current platform.
pub fn platform_window_query() -> Box<dyn WindowQuery> {
    #[cfg(windows)]
    {
        Box::new(win32::Win32WindowQuery)
    }
    #[cfg(all(unix, not(target_os = "macos")))]
    {
        Box::new(x11::X11WindowQuery::default())
    }
    #[cfg(not(any(windows, all(unix, not(target_os = "macos")))))]
    {
        Box::new(NullWindowQuery)
    }
}

#[cfg(all(unix, not(target_os = "macos")))]
pub mod x11 {
    //! X11 backend: EWMH client list for names, core protocol for geometry.

    use super::{first_match, MapState, NamePattern, WindowHandle, WindowQuery};
    use anyhow::{anyhow, Context, Result};
    use x11rb::atom_manager;
    use x11rb::connection::Connection;
    use x11rb::errors::{ConnectionError, ReplyError};
    use x11rb::protocol::xproto::{self, AtomEnum, ConnectionExt as _, Window};
    use x11rb::rust_connection::RustConnection;

    atom_manager! {
        pub AtomCollection: AtomCollectionCookie {
            _NET_CLIENT_LIST,
            _NET_WM_NAME,
            UTF8_STRING,
        }
    }

    struct Session {
        conn: RustConnection,
        root: Window,
        atoms: AtomCollection,
    }

    impl Session {
        fn open() -> Result<Self> {
            let (conn, screen_num) =
                RustConnection::connect(None).context("connect to the X server")?;
            let root = conn
                .setup()
                .roots
                .get(screen_num)
                .map(|screen| screen.root)
                .ok_or_else(|| anyhow!("X server has no screen {screen_num}"))?;
            let atoms = AtomCollection::new(&conn)?.reply()?;
            Ok(Self { conn, root, atoms })
        }

        /// Managed top-level windows, falling back to the root's children when
        /// the window manager does not publish `_NET_CLIENT_LIST`.
        fn client_windows(&self) -> Result<Vec<Window>> {
            let reply = self
                .conn
                .get_property(
                    false,
                    self.root,
                    self.atoms._NET_CLIENT_LIST,
                    AtomEnum::WINDOW,
                    0,
                    u32::MAX,
                )?
                .reply()?;
            if let Some(windows) = reply.value32() {
                return Ok(windows.collect());
            }
            Ok(self.conn.query_tree(self.root)?.reply()?.children)
        }

        fn property_bytes(
            &self,
            window: Window,
            property: impl Into<xproto::Atom>,
            type_: impl Into<xproto::Atom>,
        ) -> Result<Vec<u8>, ReplyError> {
            Ok(self
                .conn
                .get_property(false, window, property, type_, 0, u32::MAX)?
                .reply()?
                .value)
        }

        fn title(&self, window: Window) -> Result<Option<String>, ReplyError> {
            let net_wm_name =
                self.property_bytes(window, self.atoms._NET_WM_NAME, self.atoms.UTF8_STRING)?;
            if let Some(title) = decode_title(&net_wm_name) {
                return Ok(Some(title));
            }
            let wm_name = self.property_bytes(window, AtomEnum::WM_NAME, AtomEnum::ANY)?;
            Ok(decode_title(&wm_name))
        }

        fn titled_windows(&self) -> Result<Vec<(WindowHandle, String)>> {
            let mut titled = Vec::new();
            for window in self.client_windows()? {
                match self.title(window) {
                    Ok(Some(title)) => titled.push((WindowHandle(u64::from(window)), title)),
                    Ok(None) => {}
                    // Destroyed between listing and reading its name.
                    Err(ReplyError::X11Error(err)) => {
                        tracing::debug!(window, ?err, "skipping window");
                    }
                    Err(err) => return Err(err.into()),
                }
            }
            Ok(titled)
        }
    }

    /// Window title from a name property value; `None` when unset or empty.
    pub fn decode_title(raw: &[u8]) -> Option<String> {
        let title = String::from_utf8_lossy(raw);
        let title = title.trim_end_matches('\0');
        (!title.is_empty()).then(|| title.to_string())
    }

    pub fn map_state_from(state: xproto::MapState) -> MapState {
        if state == xproto::MapState::VIEWABLE {
            MapState::Viewable
        } else if state == xproto::MapState::UNVIEWABLE {
            MapState::Unviewable
        } else {
            MapState::Unmapped
        }
    }

    fn window_id(handle: WindowHandle) -> Result<Window> {
        Window::try_from(handle.0).map_err(|_| anyhow!("{handle} is not an X11 window id"))
    }

    fn is_connection_error(err: &anyhow::Error) -> bool {
        err.downcast_ref::<ConnectionError>().is_some()
            || matches!(
                err.downcast_ref::<ReplyError>(),
                Some(ReplyError::ConnectionError(_))
            )
    }

    /// Connects lazily and reconnects after the connection is lost.
    #[derive(Default)]
    pub struct X11WindowQuery {
        session: Option<Session>,
    }

    impl std::fmt::Debug for X11WindowQuery {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("X11WindowQuery")
                .field("connected", &self.session.is_some())
                .finish()
        }
    }

    impl X11WindowQuery {
        fn with_session<T>(&mut self, op: impl FnOnce(&Session) -> Result<T>) -> Result<T> {
            let session = match self.session.take() {
                Some(session) => session,
                None => Session::open()?,
            };
            let result = op(&session);
            match &result {
                Err(err) if is_connection_error(err) => {
                    tracing::warn!(?err, "lost the X server connection");
                }
                _ => self.session = Some(session),
            }
            result
        }

        fn find(&mut self, pattern: NamePattern) -> Result<Option<WindowHandle>> {
            self.with_session(|session| Ok(first_match(&session.titled_windows()?, &pattern)))
        }
    }

    impl WindowQuery for X11WindowQuery {
        fn find_by_exact_name(&mut self, name: &str) -> Result<Option<WindowHandle>> {
            self.find(NamePattern::Exact(name.to_string()))
        }

        fn find_by_prefix(&mut self, prefix: &str) -> Result<Option<WindowHandle>> {
            self.find(NamePattern::Prefix(prefix.to_string()))
        }

        fn find_by_suffix(&mut self, suffix: &str) -> Result<Option<WindowHandle>> {
            self.find(NamePattern::Suffix(suffix.to_string()))
        }

        fn map_state(&mut self, handle: WindowHandle) -> Result<MapState> {
            let window = window_id(handle)?;
            self.with_session(|session| {
                let attributes = session.conn.get_window_attributes(window)?.reply()?;
                Ok(map_state_from(attributes.map_state))
            })
        }

        fn size(&mut self, handle: WindowHandle) -> Result<(i32, i32)> {
            let window = window_id(handle)?;
            self.with_session(|session| {
                let geometry = session.conn.get_geometry(window)?.reply()?;
                Ok((i32::from(geometry.width), i32::from(geometry.height)))
            })
        }

        fn translate_to_root(&mut self, handle: WindowHandle) -> Result<(i32, i32)> {
            let window = window_id(handle)?;
            self.with_session(|session| {
                let origin = session
                    .conn
                    .translate_coordinates(window, session.root, 0, 0)?
                    .reply()?;
                Ok((i32::from(origin.dst_x), i32::from(origin.dst_y)))
            })
        }
    }

}

#[cfg(windows)]
pub mod win32 {
    //! Win32 backend: top-level window enumeration by title.

    use super::{first_match, MapState, NamePattern, WindowHandle, WindowQuery};
    use anyhow::{anyhow, Context, Result};
    use windows::Win32::Foundation::{BOOL, HWND, LPARAM, POINT, RECT};
    use windows::Win32::Graphics::Gdi::ClientToScreen;
    use windows::Win32::UI::WindowsAndMessaging::{
        EnumWindows, GetClientRect, GetWindowTextLengthW, GetWindowTextW, IsIconic, IsWindow,
        IsWindowVisible,
    };

    #[derive(Debug, Default)]
    pub struct Win32WindowQuery;

    fn hwnd(handle: WindowHandle) -> Result<HWND> {
        let hwnd = HWND(handle.0 as usize as *mut core::ffi::c_void);
        if unsafe { IsWindow(hwnd) }.as_bool() {
            Ok(hwnd)
        } else {
            Err(anyhow!("window {handle} no longer exists"))
        }
    }

    fn enumerate() -> Result<Vec<(WindowHandle, String)>> {
        unsafe extern "system" fn enum_cb(hwnd: HWND, lparam: LPARAM) -> BOOL {
            let windows = &mut *(lparam.0 as *mut Vec<(WindowHandle, String)>);
            let title_len = GetWindowTextLengthW(hwnd);
            if title_len <= 0 {
                return BOOL(1);
            }
            let mut title_buf = vec![0u16; title_len as usize + 1];
            let title_read = GetWindowTextW(hwnd, &mut title_buf);
            if title_read > 0 {
                let title = String::from_utf16_lossy(&title_buf[..title_read as usize]);
                windows.push((WindowHandle(hwnd.0 as usize as u64), title));
            }
            BOOL(1)
        }

        let mut windows: Vec<(WindowHandle, String)> = Vec::new();
        unsafe {
            EnumWindows(
                Some(enum_cb),
                LPARAM(&mut windows as *mut Vec<(WindowHandle, String)> as isize),
            )
            .context("enumerate top-level windows")?;
        }
        Ok(windows)
    }

    impl Win32WindowQuery {
        fn find(&self, pattern: NamePattern) -> Result<Option<WindowHandle>> {
            Ok(first_match(&enumerate()?, &pattern))
        }
    }

    impl WindowQuery for Win32WindowQuery {
        fn find_by_exact_name(&mut self, name: &str) -> Result<Option<WindowHandle>> {
            self.find(NamePattern::Exact(name.to_string()))
        }

        fn find_by_prefix(&mut self, prefix: &str) -> Result<Option<WindowHandle>> {
            self.find(NamePattern::Prefix(prefix.to_string()))
        }

        fn find_by_suffix(&mut self, suffix: &str) -> Result<Option<WindowHandle>> {
            self.find(NamePattern::Suffix(suffix.to_string()))
        }

        fn map_state(&mut self, handle: WindowHandle) -> Result<MapState> {
            let hwnd = hwnd(handle)?;
            let state = unsafe {
                if IsIconic(hwnd).as_bool() || !IsWindowVisible(hwnd).as_bool() {
                    MapState::Unmapped
                } else {
                    MapState::Viewable
                }
            };
            Ok(state)
        }

        fn size(&mut self, handle: WindowHandle) -> Result<(i32, i32)> {
            let hwnd = hwnd(handle)?;
            let mut rect = RECT::default();
            unsafe { GetClientRect(hwnd, &mut rect) }.context("read client rect")?;
            Ok((rect.right - rect.left, rect.bottom - rect.top))
        }

        fn translate_to_root(&mut self, handle: WindowHandle) -> Result<(i32, i32)> {
            let hwnd = hwnd(handle)?;
            let mut origin = POINT { x: 0, y: 0 };
            if !unsafe { ClientToScreen(hwnd, &mut origin) }.as_bool() {
                return Err(anyhow!("translate client origin of {handle}"));
            }
            Ok((origin.x, origin.y))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xterm() -> StaticWindow {
        StaticWindow {
            handle: WindowHandle(7),
            title: "xTerm".into(),
            geometry: WindowGeometry::new(640, 480, 10, 20),
            map_state: MapState::Viewable,
        }
    }

    #[test]
    fn wildcard_position_selects_lookup_kind() {
        assert_eq!(NamePattern::parse("*Term"), NamePattern::Suffix("Term".into()));
        assert_eq!(NamePattern::parse("xTe*"), NamePattern::Prefix("xTe".into()));
        assert_eq!(NamePattern::parse("xTerm"), NamePattern::Exact("xTerm".into()));
        assert_eq!(NamePattern::parse("*Term").to_string(), "*Term");
    }

    #[test]
    fn suffix_pattern_uses_suffix_lookup_only() {
        let mut query = StaticWindowQuery::with_windows(vec![xterm()]);
        let found = NamePattern::parse("*Term").lookup(&mut query).unwrap();
        assert_eq!(found, Some(WindowHandle(7)));
        assert_eq!(query.lookups, vec![LookupKind::Suffix]);

        assert_eq!(
            NamePattern::Exact("Term".into()).lookup(&mut query).unwrap(),
            None
        );
        assert_eq!(
            NamePattern::Prefix("Term".into()).lookup(&mut query).unwrap(),
            None
        );
    }

    #[test]
    fn null_query_never_finds_windows() {
        let mut query = NullWindowQuery;
        assert_eq!(query.find_by_exact_name("anything").unwrap(), None);
        assert!(query.map_state(WindowHandle(1)).is_err());
    }
}
