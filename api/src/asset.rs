//! Defines the assets a user can select for purchase, and their metadata.

use serde::Deserialize;
use serde::Serialize;
use std::fmt;

/// Identifies which asset proxy (token standard) an asset is traded through.
#[derive(
    Debug,
    PartialEq,
    Eq,
    Hash,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    strum::EnumIs,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum AssetProxyId {
    #[strum(serialize = "erc20")]
    Erc20,
    #[strum(serialize = "erc721")]
    Erc721,
}

/// The encoded on-chain asset data handed to the quote provider.
///
/// This is opaque to the quoting flow. It is only compared, hashed and forwarded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetData(String);

impl AssetData {
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Metadata of a fungible ERC20 token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Erc20AssetMetaData {
    /// Number of decimal digits between the human amount and the base unit.
    pub decimals: u8,
    pub symbol: String,
    pub primary_color: Option<String>,
}

/// Metadata of a non-fungible ERC721 token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Erc721AssetMetaData {
    pub name: String,
    pub representation_url: Option<String>,
    pub primary_color: Option<String>,
}

/// Metadata for any supported asset, tagged by its proxy id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "assetProxyId", rename_all = "lowercase")]
pub enum AssetMetaData {
    Erc20(Erc20AssetMetaData),
    Erc721(Erc721AssetMetaData),
}

impl AssetMetaData {
    pub fn asset_proxy_id(&self) -> AssetProxyId {
        match self {
            Self::Erc20(_) => AssetProxyId::Erc20,
            Self::Erc721(_) => AssetProxyId::Erc721,
        }
    }
}

/// An asset as selected by the user: its on-chain data plus metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub asset_data: AssetData,
    pub meta_data: AssetMetaData,
}

impl Asset {
    /// Returns the ERC20 view of this asset, or `None` for any other asset class.
    ///
    /// Only ERC20 assets take part in quoting; callers treat `None` exactly like
    /// "no asset selected".
    pub fn as_erc20(&self) -> Option<Erc20Asset> {
        match &self.meta_data {
            AssetMetaData::Erc20(meta_data) => Some(Erc20Asset {
                asset_data: self.asset_data.clone(),
                meta_data: meta_data.clone(),
            }),
            AssetMetaData::Erc721(_) => None,
        }
    }
}

/// An asset known to be an ERC20 token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Erc20Asset {
    pub asset_data: AssetData,
    pub meta_data: Erc20AssetMetaData,
}

impl Erc20Asset {
    pub fn new(asset_data: AssetData, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            asset_data,
            meta_data: Erc20AssetMetaData {
                decimals,
                symbol: symbol.into(),
                primary_color: None,
            },
        }
    }

    pub fn decimals(&self) -> u8 {
        self.meta_data.decimals
    }

    pub fn symbol(&self) -> &str {
        &self.meta_data.symbol
    }
}

impl From<Erc20Asset> for Asset {
    fn from(asset: Erc20Asset) -> Self {
        Self {
            asset_data: asset.asset_data,
            meta_data: AssetMetaData::Erc20(asset.meta_data),
        }
    }
}
