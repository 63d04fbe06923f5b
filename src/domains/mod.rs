pub mod identicon;
