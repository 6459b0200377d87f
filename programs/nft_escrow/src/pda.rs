use anchor_lang::prelude::*;

use crate::{
    constants::{CUSTODY_SEED, ESCROW_STATE_SEED},
    errors::EscrowError,
    state::EscrowState,
};

/// Finds the escrow state address for `(owner, nft_mint)` and its bump.
pub fn find_escrow_state_address(owner: &Pubkey, nft_mint: &Pubkey) -> Result<(Pubkey, u8)> {
    Pubkey::try_find_program_address(&[ESCROW_STATE_SEED, owner.as_ref(), nft_mint.as_ref()], &crate::ID)
        .ok_or_else(|| error!(EscrowError::DerivationExhausted))
}

/// Finds the custody token account address for `(owner, nft_mint)` and its bump.
pub fn find_custody_address(owner: &Pubkey, nft_mint: &Pubkey) -> Result<(Pubkey, u8)> {
    Pubkey::try_find_program_address(&[CUSTODY_SEED, owner.as_ref(), nft_mint.as_ref()], &crate::ID)
        .ok_or_else(|| error!(EscrowError::DerivationExhausted))
}

/// Recomputes the escrow state address from a stored bump, without searching.
pub fn escrow_state_address(owner: &Pubkey, nft_mint: &Pubkey, bump: u8) -> Result<Pubkey> {
    Pubkey::create_program_address(
        &[ESCROW_STATE_SEED, owner.as_ref(), nft_mint.as_ref(), &[bump]],
        &crate::ID,
    )
    .map_err(|_| error!(EscrowError::AccountMismatch))
}

/// Recomputes the custody address from a stored bump, without searching.
pub fn custody_address(owner: &Pubkey, nft_mint: &Pubkey, bump: u8) -> Result<Pubkey> {
    Pubkey::create_program_address(
        &[CUSTODY_SEED, owner.as_ref(), nft_mint.as_ref(), &[bump]],
        &crate::ID,
    )
    .map_err(|_| error!(EscrowError::AccountMismatch))
}

/// Both custody addresses of one `(owner, nft_mint)` pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EscrowAddresses {
    pub escrow_state: Pubkey,
    pub state_bump: u8,
    pub custody: Pubkey,
    pub token_bump: u8,
}

impl EscrowAddresses {
    pub fn derive(owner: &Pubkey, nft_mint: &Pubkey) -> Result<Self> {
        let (escrow_state, state_bump) = find_escrow_state_address(owner, nft_mint)?;
        let (custody, token_bump) = find_custody_address(owner, nft_mint)?;
        Ok(Self {
            escrow_state,
            state_bump,
            custody,
            token_bump,
        })
    }

    /// Checks caller-supplied accounts against the derived ones.
    pub fn verify(&self, escrow_state: &Pubkey, custody: &Pubkey) -> Result<()> {
        require_keys_eq!(*escrow_state, self.escrow_state, EscrowError::AccountMismatch);
        require_keys_eq!(*custody, self.custody, EscrowError::AccountMismatch);
        Ok(())
    }
}

/// Signing capability of the escrow state PDA over its custody account.
///
/// Only obtainable from a record whose address re-derives from its own stored
/// fields, so a substituted account can never sign for custody.
#[derive(Debug)]
pub struct CustodyAuthority {
    address: Pubkey,
    owner: Pubkey,
    nft_mint: Pubkey,
    bump: [u8; 1],
}

impl CustodyAuthority {
    pub(crate) fn for_escrow(state: &EscrowState, supplied: &Pubkey) -> Result<Self> {
        let address = escrow_state_address(&state.owner, &state.nft_mint, state.state_bump)?;
        require_keys_eq!(address, *supplied, EscrowError::AccountMismatch);

        Ok(Self {
            address,
            owner: state.owner,
            nft_mint: state.nft_mint,
            bump: [state.state_bump],
        })
    }

    pub fn address(&self) -> Pubkey {
        self.address
    }

    pub fn signer_seeds(&self) -> [&[u8]; 4] {
        [
            ESCROW_STATE_SEED,
            self.owner.as_ref(),
            self.nft_mint.as_ref(),
            &self.bump,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(owner: Pubkey, nft_mint: Pubkey) -> EscrowState {
        let addresses = EscrowAddresses::derive(&owner, &nft_mint).unwrap();
        EscrowState {
            owner,
            nft_mint,
            currency_mint: Pubkey::new_unique(),
            price: 1,
            state_bump: addresses.state_bump,
            token_bump: addresses.token_bump,
        }
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let owner = Pubkey::new_unique();
        let nft_mint = Pubkey::new_unique();

        assert_eq!(
            EscrowAddresses::derive(&owner, &nft_mint).unwrap(),
            EscrowAddresses::derive(&owner, &nft_mint).unwrap()
        );
    }

    #[test]
    fn test_namespaces_never_collide() {
        let owner = Pubkey::new_unique();
        let nft_mint = Pubkey::new_unique();
        let addresses = EscrowAddresses::derive(&owner, &nft_mint).unwrap();

        assert_ne!(addresses.escrow_state, addresses.custody);
        assert!(!addresses.escrow_state.is_on_curve());
        assert!(!addresses.custody.is_on_curve());
    }

    #[test]
    fn test_addresses_are_keyed_by_owner_and_mint() {
        let owner = Pubkey::new_unique();
        let nft_mint = Pubkey::new_unique();
        let base = EscrowAddresses::derive(&owner, &nft_mint).unwrap();

        let other_owner = EscrowAddresses::derive(&Pubkey::new_unique(), &nft_mint).unwrap();
        let other_mint = EscrowAddresses::derive(&owner, &Pubkey::new_unique()).unwrap();
        assert_ne!(base.escrow_state, other_owner.escrow_state);
        assert_ne!(base.escrow_state, other_mint.escrow_state);
    }

    #[test]
    fn test_stored_bumps_rederive_the_same_addresses() {
        let owner = Pubkey::new_unique();
        let nft_mint = Pubkey::new_unique();
        let addresses = EscrowAddresses::derive(&owner, &nft_mint).unwrap();

        assert_eq!(
            escrow_state_address(&owner, &nft_mint, addresses.state_bump).unwrap(),
            addresses.escrow_state
        );
        assert_eq!(
            custody_address(&owner, &nft_mint, addresses.token_bump).unwrap(),
            addresses.custody
        );
    }

    #[test]
    fn test_verify_rejects_substituted_accounts() {
        let owner = Pubkey::new_unique();
        let nft_mint = Pubkey::new_unique();
        let addresses = EscrowAddresses::derive(&owner, &nft_mint).unwrap();

        assert!(addresses.verify(&addresses.escrow_state, &addresses.custody).is_ok());
        assert_eq!(
            addresses.verify(&Pubkey::new_unique(), &addresses.custody).unwrap_err(),
            EscrowError::AccountMismatch.into()
        );
        assert_eq!(
            addresses.verify(&addresses.escrow_state, &addresses.escrow_state).unwrap_err(),
            EscrowError::AccountMismatch.into()
        );
    }

    #[test]
    fn test_custody_authority_requires_matching_record() {
        let state = record(Pubkey::new_unique(), Pubkey::new_unique());
        let (address, _) = find_escrow_state_address(&state.owner, &state.nft_mint).unwrap();

        let authority = CustodyAuthority::for_escrow(&state, &address).unwrap();
        assert_eq!(authority.address(), address);
        assert_eq!(authority.signer_seeds()[3], &[state.state_bump]);

        assert_eq!(
            CustodyAuthority::for_escrow(&state, &Pubkey::new_unique()).unwrap_err(),
            EscrowError::AccountMismatch.into()
        );
    }
}
