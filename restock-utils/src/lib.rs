/// Derives `From<T>` for a target that already implements `From<&T>`, so
/// transfer objects only have to spell out the reference conversion.
#[macro_export]
macro_rules! derive_from_reference {
    ($from_type:ty, $impl_type:ty) => {
        impl From<$from_type> for $impl_type {
            fn from(value: $from_type) -> Self {
                Self::from(&value)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    struct StockLevel {
        on_hand: u32,
    }
    struct StockLevelTO {
        on_hand: u32,
    }

    impl From<&StockLevel> for StockLevelTO {
        fn from(level: &StockLevel) -> Self {
            Self {
                on_hand: level.on_hand,
            }
        }
    }
    derive_from_reference!(StockLevel, StockLevelTO);

    #[test]
    fn test_owned_conversion_follows_reference_conversion() {
        let level = StockLevel { on_hand: 7 };
        let to: StockLevelTO = level.into();
        assert_eq!(7, to.on_hand);
    }
}
