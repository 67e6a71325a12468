//! Device profiles and their command tables.

use core::fmt;
use core::str::FromStr;

use snafu::OptionExt;

use crate::types::{Direction, Error, UnknownProfileSnafu};

/// The first preamble byte of a framed command.
pub const PREAMBLE_0: u8 = 0x55;
/// The second preamble byte of a framed command.
pub const PREAMBLE_1: u8 = 0xAA;

/// Selects which controller on the bus is decoded.
///
/// ## Example
/// ```
/// use bm_i2c_proto::DeviceProfile;
/// let profile: DeviceProfile = "dsPIC".parse().unwrap();
/// assert_eq!(profile, DeviceProfile::Controller);
/// assert_eq!(profile.address(), 0x20);
/// ```
#[derive(PartialEq, Eq, Debug, Copy, Clone, Hash)]
pub enum DeviceProfile {
    /// APW power supply controller.
    PowerSupply,
    /// dsPIC hash board microcontroller.
    Controller,
}

/// Byte order of the two checksum bytes at the end of a frame.
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub enum ChecksumOrder {
    /// High byte first.
    BigEndian,
    /// Low byte first.
    LittleEndian,
}

impl DeviceProfile {
    /// I2C target address of the device.
    pub const fn address(self) -> u8 {
        match self {
            Self::PowerSupply => 0x10,
            Self::Controller => 0x20,
        }
    }

    /// Canonical profile name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::PowerSupply => "APW",
            Self::Controller => "dsPIC",
        }
    }

    /// Number of preamble bytes (`0x55 0xAA`) leading a transfer in `direction`.
    ///
    /// Everything carries the preamble except the dsPIC read responses.
    pub const fn preamble_len(self, direction: Direction) -> usize {
        match (self, direction) {
            (Self::Controller, Direction::Response) => 0,
            _ => 2,
        }
    }

    /// Order of the checksum bytes for a transfer in `direction`.
    ///
    /// APW responses are the only little endian checksums on the bus.
    pub const fn checksum_order(self, direction: Direction) -> ChecksumOrder {
        match (self, direction) {
            (Self::PowerSupply, Direction::Response) => ChecksumOrder::LittleEndian,
            _ => ChecksumOrder::BigEndian,
        }
    }

    /// Look up `code` in the command table of this profile.
    pub fn command(self, code: u8) -> Option<Command> {
        use Command::*;
        let cmd = match self {
            Self::PowerSupply => match code {
                131 => SetVoltage,
                _ => return None,
            },
            Self::Controller => match code {
                2 => WriteApp,
                6 => JumpApp,
                7 => Init,
                9 => EraseApp,
                16 => SetSomething3,
                21 => PowerSwitch,
                22 => HeartBeat,
                23 => GetFwVersion,
                40 => GetSomething9,
                41 => GetVoltage,
                43 => GetSomething5,
                49 => SetSomething1,
                _ => return None,
            },
        };
        Some(cmd)
    }

    /// Resolve `code` to a command, falling back to [`Command::Unknown`].
    pub fn resolve(self, code: u8) -> Command {
        self.command(code).unwrap_or(Command::Unknown)
    }
}

impl FromStr for DeviceProfile {
    type Err = Error;

    /// Accepts the canonical names, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::PowerSupply, Self::Controller]
            .iter()
            .copied()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .context(UnknownProfileSnafu)
    }
}

impl fmt::Display for DeviceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Semantic type of a frame, resolved from its command code.
#[derive(PartialEq, Eq, Debug, Copy, Clone, Hash)]
pub enum Command {
    WriteApp,
    JumpApp,
    Init,
    EraseApp,
    SetSomething3,
    PowerSwitch,
    HeartBeat,
    GetFwVersion,
    GetSomething9,
    GetVoltage,
    GetSomething5,
    SetSomething1,
    SetVoltage,
    /// The code isn't in the profile's table.
    Unknown,
}

impl Command {
    /// Type name of the request frame.
    pub const fn name(self) -> &'static str {
        use Command::*;
        match self {
            WriteApp => "write_app",
            JumpApp => "jump_app",
            Init => "init",
            EraseApp => "erase_app",
            SetSomething3 => "set_something_3",
            PowerSwitch => "power_switch",
            HeartBeat => "heart_beat",
            GetFwVersion => "get_fw_version",
            GetSomething9 => "get_something_9",
            GetVoltage => "get_voltage",
            GetSomething5 => "get_something_5",
            SetSomething1 => "set_something_1",
            SetVoltage => "set_voltage",
            Unknown => "unknown",
        }
    }

    /// Type name of the response frame, for commands that have one.
    pub const fn response_name(self) -> Option<&'static str> {
        use Command::*;
        let name = match self {
            SetSomething3 => "set_something_3_resp",
            PowerSwitch => "power_switch_resp",
            GetFwVersion => "get_fw_version_resp",
            GetSomething9 => "get_something_9_resp",
            GetVoltage => "get_voltage_resp",
            GetSomething5 => "get_something_5_resp",
            SetSomething1 => "set_something_1_resp",
            _ => return None,
        };
        Some(name)
    }

    /// Type name of a frame completed in `direction`.
    pub fn type_name(self, direction: Direction) -> &'static str {
        match direction {
            Direction::Response => self.response_name().unwrap_or_else(|| self.name()),
            Direction::Request => self.name(),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_from_str() {
        assert_eq!("APW".parse::<DeviceProfile>(), Ok(DeviceProfile::PowerSupply));
        assert_eq!("apw".parse::<DeviceProfile>(), Ok(DeviceProfile::PowerSupply));
        assert_eq!("DSPIC".parse::<DeviceProfile>(), Ok(DeviceProfile::Controller));
        assert_eq!("pic".parse::<DeviceProfile>(), Err(Error::UnknownProfile));
        assert_eq!(DeviceProfile::Controller.to_string(), "dsPIC");
    }

    #[test]
    fn test_preamble_and_order() {
        use Direction::*;
        assert_eq!(DeviceProfile::PowerSupply.preamble_len(Request), 2);
        assert_eq!(DeviceProfile::PowerSupply.preamble_len(Response), 2);
        assert_eq!(DeviceProfile::Controller.preamble_len(Request), 2);
        assert_eq!(DeviceProfile::Controller.preamble_len(Response), 0);

        assert_eq!(
            DeviceProfile::PowerSupply.checksum_order(Response),
            ChecksumOrder::LittleEndian
        );
        assert_eq!(
            DeviceProfile::PowerSupply.checksum_order(Request),
            ChecksumOrder::BigEndian
        );
        assert_eq!(
            DeviceProfile::Controller.checksum_order(Response),
            ChecksumOrder::BigEndian
        );
    }

    #[test]
    fn test_resolve() {
        let apw = DeviceProfile::PowerSupply;
        let pic = DeviceProfile::Controller;
        assert_eq!(apw.resolve(131), Command::SetVoltage);
        assert_eq!(apw.resolve(23), Command::Unknown);
        assert_eq!(pic.resolve(23), Command::GetFwVersion);
        assert_eq!(pic.resolve(131), Command::Unknown);
        assert_eq!(pic.resolve(99), Command::Unknown);
        assert_eq!(apw.command(99), None);
    }

    #[test]
    fn test_type_name() {
        use Direction::*;
        assert_eq!(Command::GetVoltage.type_name(Response), "get_voltage_resp");
        assert_eq!(Command::GetVoltage.type_name(Request), "get_voltage");
        // no distinguished response variant
        assert_eq!(Command::HeartBeat.type_name(Response), "heart_beat");
        assert_eq!(Command::SetVoltage.type_name(Response), "set_voltage");
        assert_eq!(Command::Unknown.type_name(Response), "unknown");
    }
}
