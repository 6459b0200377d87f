use anchor_lang::{prelude::*, system_program};

use crate::errors::EscrowError;

/// An open listing: one NFT unit parked in custody at a fixed price
#[account(discriminator = 1)]
#[derive(InitSpace, Debug, PartialEq)]
pub struct EscrowState {
    /// The seller's wallet address (the only key allowed to cancel)
    pub owner: Pubkey,
    /// Mint of the NFT held in custody
    pub nft_mint: Pubkey,
    /// Mint the price is paid in
    pub currency_mint: Pubkey,
    /// Amount of `currency_mint` the buyer pays
    pub price: u64,
    /// Bump of this record's own address
    pub state_bump: u8,
    /// Bump of the custody token account address
    pub token_bump: u8,
}

impl EscrowState {
    /// A record allocated by `init_if_needed` but never populated is not an escrow.
    pub fn is_open(&self) -> bool {
        self.owner != Pubkey::default() && self.price > 0
    }

    /// Reads the record behind `info`, returning `None` when no open escrow lives there.
    pub fn load(info: &AccountInfo) -> Result<Option<Self>> {
        if info.owner != &crate::ID || info.data_is_empty() {
            return Ok(None);
        }
        let state = Self::try_deserialize(&mut &info.try_borrow_data()?[..])?;
        Ok(Some(state).filter(Self::is_open))
    }

    /// Closes the record behind `info`, returning its rent to `destination`.
    ///
    /// The data is zeroed and the account handed back to the system program, which
    /// drops it once the transaction ends.
    pub fn close<'info>(info: AccountInfo<'info>, destination: AccountInfo<'info>) -> Result<()> {
        require_keys_eq!(*info.owner, crate::ID, EscrowError::EscrowNotFound);

        let lamports = destination
            .lamports()
            .checked_add(info.lamports())
            .ok_or(ProgramError::ArithmeticOverflow)?;
        **destination.try_borrow_mut_lamports()? = lamports;
        **info.try_borrow_mut_lamports()? = 0;

        info.try_borrow_mut_data()?.fill(0);
        info.assign(&system_program::ID);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(price: u64) -> EscrowState {
        EscrowState {
            owner: Pubkey::new_unique(),
            nft_mint: Pubkey::new_unique(),
            currency_mint: Pubkey::new_unique(),
            price,
            state_bump: 255,
            token_bump: 254,
        }
    }

    #[test]
    fn test_is_open() {
        assert!(listing(1).is_open());
        assert!(!listing(0).is_open());

        let mut blank = listing(10);
        blank.owner = Pubkey::default();
        assert!(!blank.is_open());
    }

    #[test]
    fn test_space_is_fixed() {
        // three keys, a u64 price and two single-byte bumps
        assert_eq!(EscrowState::INIT_SPACE, 32 * 3 + 8 + 1 + 1);
    }

    #[test]
    fn test_load_skips_foreign_and_empty_accounts() {
        let key = Pubkey::new_unique();
        let system = Pubkey::default();
        let mut lamports = 0;
        let mut data: Vec<u8> = vec![];
        let info = AccountInfo::new(&key, false, true, &mut lamports, &mut data, &system, false, 0);
        assert_eq!(EscrowState::load(&info).unwrap(), None);
    }

    #[test]
    fn test_load_reads_open_record() {
        let state = listing(500_000_000);
        let mut data = Vec::new();
        state.try_serialize(&mut data).unwrap();

        let key = Pubkey::new_unique();
        let mut lamports = 1_000_000;
        let info = AccountInfo::new(&key, false, true, &mut lamports, &mut data, &crate::ID, false, 0);
        assert_eq!(EscrowState::load(&info).unwrap(), Some(state));
    }

    #[test]
    fn test_close_refunds_rent_and_releases_account() {
        let state = listing(600);
        let mut data = Vec::new();
        state.try_serialize(&mut data).unwrap();

        let key = Pubkey::new_unique();
        let owner = Box::new(crate::ID);
        let mut lamports = 1_500_000;
        let info = AccountInfo::new(&key, false, true, &mut lamports, &mut data, &owner, false, 0);

        let seller = Pubkey::new_unique();
        let system = Pubkey::default();
        let mut seller_lamports = 10;
        let mut seller_data: Vec<u8> = vec![];
        let destination = AccountInfo::new(
            &seller,
            false,
            true,
            &mut seller_lamports,
            &mut seller_data,
            &system,
            false,
            0,
        );

        EscrowState::close(info.clone(), destination.clone()).unwrap();

        assert_eq!(info.lamports(), 0);
        assert_eq!(destination.lamports(), 1_500_010);
        assert_eq!(*info.owner, system_program::ID);
        assert!(info.try_borrow_data().unwrap().iter().all(|byte| *byte == 0));
        assert_eq!(EscrowState::load(&info).unwrap(), None);
    }

    #[test]
    fn test_close_rejects_foreign_account() {
        let key = Pubkey::new_unique();
        let system = Pubkey::default();
        let mut lamports = 5;
        let mut data: Vec<u8> = vec![];
        let info = AccountInfo::new(&key, false, true, &mut lamports, &mut data, &system, false, 0);

        assert_eq!(
            EscrowState::close(info.clone(), info).unwrap_err(),
            EscrowError::EscrowNotFound.into()
        );
    }
}
