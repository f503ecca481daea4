use super::types::HostPort;
use crate::error::ValidationError;

pub(super) fn parse_port(value: &str) -> Result<u16, ValidationError> {
    match value.trim().parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        Ok(_) | Err(_) => Err(ValidationError::InvalidPort {
            value: value.to_owned(),
        }),
    }
}

pub(super) fn parse_host_port(value: &str) -> Result<HostPort, ValidationError> {
    let Some((host, port_part)) = value.split_once(':') else {
        return Err(ValidationError::InvalidAddressFormat {
            value: value.to_owned(),
        });
    };
    if host.is_empty() {
        return Err(ValidationError::AddressHostEmpty {
            value: value.to_owned(),
        });
    }
    let port: u16 =
        port_part
            .trim()
            .parse()
            .map_err(|err| ValidationError::InvalidAddressPort {
                value: value.to_owned(),
                source: err,
            })?;
    if port == 0 {
        return Err(ValidationError::InvalidPort {
            value: value.to_owned(),
        });
    }
    Ok(HostPort {
        host: host.to_owned(),
        port,
    })
}
