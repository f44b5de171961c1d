//! Convenience macros for working with LGAP zones.

/// Creates a [`ZoneNumber`](crate::addressing::ZoneNumber) from a literal.
///
/// The range check runs at compile time, so a typo in a zone table fails the
/// build instead of failing registration at startup.
///
/// # Examples
///
/// ```
/// use lgap_bus::zone;
///
/// let living_room = zone!(0);
/// let bedroom = zone!(3);
/// assert_eq!(bedroom.raw(), 3);
/// ```
///
/// ```compile_fail
/// // Zone numbers stop at 63
/// let zone = lgap_bus::zone!(64);
/// ```
#[macro_export]
macro_rules! zone {
    ($n:literal) => {{
        const _: () = {
            if $n > $crate::addressing::ZoneNumber::MAX {
                panic!("Zone number must be 0-63");
            }
        };
        $crate::addressing::ZoneNumber::new_unchecked($n)
    }};
}

/// Builds a fixed list of [`ZoneConfig`](crate::config::ZoneConfig) entries.
///
/// Each entry is `zone => "id"` or `zone => "id" as "Display Name"`. Entity
/// bindings can still be attached afterwards with
/// [`ZoneConfig::bind`](crate::config::ZoneConfig::bind).
///
/// # Examples
///
/// ```
/// use lgap_bus::zone_configs;
///
/// let zones = zone_configs! {
///     0 => "lounge_climate" as "Lounge",
///     1 => "office_climate",
/// }
/// .unwrap();
/// assert_eq!(zones.len(), 2);
/// ```
///
/// # Returns
///
/// - `Ok(heapless::Vec<ZoneConfig, MAX_ZONES>)` when every id and name fits
/// - `Err(LgapError::Config(_))` when an id or name is too long
/// - `Err(LgapError::RegistryFull)` when more than `MAX_ZONES` entries are given
#[macro_export]
macro_rules! zone_configs {
    ($($zone:literal => $id:literal $(as $name:literal)?),* $(,)?) => {{
        (|| -> $crate::error::Result<
            $crate::heapless::Vec<$crate::config::ZoneConfig, { $crate::zone::MAX_ZONES }>,
        > {
            let mut zones = $crate::heapless::Vec::new();
            $(
                #[allow(unused_mut, reason = "only mutated when a name is given")]
                let mut config = $crate::config::ZoneConfig::new($crate::zone!($zone), $id)?;
                $( config = config.with_name($name)?; )?
                zones
                    .push(config)
                    .map_err(|_| $crate::error::LgapError::RegistryFull)?;
            )*
            Ok(zones)
        })()
    }};
}
