//! Conversion between unix `st_mode` values and the portable file-mode
//! integer carried on the wire.
//!
//! The wire encoding keeps the nine permission bits in place and moves the
//! file type and setuid/setgid/sticky flags into the high bits, so a plain
//! `0644` file reads as `420` and a `0755` directory as `2147484141`.

pub const MODE_DIR: u32 = 1 << 31;
pub const MODE_SYMLINK: u32 = 1 << 27;
pub const MODE_DEVICE: u32 = 1 << 26;
pub const MODE_NAMED_PIPE: u32 = 1 << 25;
pub const MODE_SOCKET: u32 = 1 << 24;
pub const MODE_SETUID: u32 = 1 << 23;
pub const MODE_SETGID: u32 = 1 << 22;
pub const MODE_CHAR_DEVICE: u32 = 1 << 21;
pub const MODE_STICKY: u32 = 1 << 20;
pub const MODE_IRREGULAR: u32 = 1 << 19;

const PERM_MASK: u32 = 0o777;

const S_IFMT: u32 = 0o170000;
const S_IFSOCK: u32 = 0o140000;
const S_IFLNK: u32 = 0o120000;
const S_IFREG: u32 = 0o100000;
const S_IFBLK: u32 = 0o060000;
const S_IFDIR: u32 = 0o040000;
const S_IFCHR: u32 = 0o020000;
const S_IFIFO: u32 = 0o010000;
const S_ISUID: u32 = 0o4000;
const S_ISGID: u32 = 0o2000;
const S_ISVTX: u32 = 0o1000;

/// Wire mode for a raw `st_mode`
pub fn from_unix(raw: u32) -> u32 {
    let mut mode = raw & PERM_MASK;

    mode |= match raw & S_IFMT {
        S_IFREG => 0,
        S_IFDIR => MODE_DIR,
        S_IFLNK => MODE_SYMLINK,
        S_IFBLK => MODE_DEVICE,
        S_IFCHR => MODE_DEVICE | MODE_CHAR_DEVICE,
        S_IFIFO => MODE_NAMED_PIPE,
        S_IFSOCK => MODE_SOCKET,
        _ => MODE_IRREGULAR,
    };

    if raw & S_ISUID != 0 {
        mode |= MODE_SETUID;
    }
    if raw & S_ISGID != 0 {
        mode |= MODE_SETGID;
    }
    if raw & S_ISVTX != 0 {
        mode |= MODE_STICKY;
    }
    mode
}

/// Permission bits to apply for a wire mode; type bits are ignored
pub fn to_unix(wire: u32) -> u32 {
    let mut mode = wire & PERM_MASK;

    if wire & MODE_SETUID != 0 {
        mode |= S_ISUID;
    }
    if wire & MODE_SETGID != 0 {
        mode |= S_ISGID;
    }
    if wire & MODE_STICKY != 0 {
        mode |= S_ISVTX;
    }
    mode
}
