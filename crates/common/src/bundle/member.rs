/// Role of one archive member, derived solely from its trailing suffix
///
/// A closed enumeration: classification happens once per member during
/// the classification pass, and the extraction loop dispatches on the
/// role instead of re-comparing suffix strings. Unknown suffixes are
/// never an error, they classify as `Plain` for forward compatibility
/// with future bundle producers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberRole {
    /// Opaque payload, copied verbatim to the destination
    Plain,
    /// RSA-OAEP wrapped bundle key (`.key`)
    WrappedKey,
    /// Raw GCM nonce paired with a same-stem ciphertext (`.iv`)
    Nonce,
    /// AES-256-GCM ciphertext with trailing auth tag (`.enc`)
    Ciphertext,
}

impl MemberRole {
    /// Classify a member name by its trailing suffix (case-insensitive)
    pub fn classify(name: &str) -> Self {
        match name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()) {
            Some(ext) if ext == "key" => MemberRole::WrappedKey,
            Some(ext) if ext == "iv" => MemberRole::Nonce,
            Some(ext) if ext == "enc" => MemberRole::Ciphertext,
            _ => MemberRole::Plain,
        }
    }
}

/// One named entry inside a bundle archive
///
/// Created by the classification pass and consumed by the extraction
/// pass; none survive past a single unpack operation.
#[derive(Debug, Clone)]
pub struct ArchiveMember {
    /// Member name, always containing at least one directory segment
    pub name: String,
    /// Role derived from the name's trailing suffix
    pub role: MemberRole,
}

impl ArchiveMember {
    pub fn new(name: String) -> Self {
        let role = MemberRole::classify(&name);
        Self { name, role }
    }

    /// Member name with the crypto-role suffix stripped
    ///
    /// For `Plain` members this is the full name. Ciphertext and nonce
    /// members sharing a stem form a pair; the stem is also the path a
    /// decrypted ciphertext is written to.
    pub fn stem(&self) -> &str {
        match self.role {
            MemberRole::Plain => &self.name,
            _ => self
                .name
                .rsplit_once('.')
                .map(|(stem, _)| stem)
                .unwrap_or(&self.name),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_classify_by_suffix() {
        assert_eq!(MemberRole::classify("a/b.key"), MemberRole::WrappedKey);
        assert_eq!(MemberRole::classify("a/b.txt.iv"), MemberRole::Nonce);
        assert_eq!(MemberRole::classify("a/b.txt.enc"), MemberRole::Ciphertext);
        assert_eq!(MemberRole::classify("a/b.txt"), MemberRole::Plain);
        assert_eq!(MemberRole::classify("a/b"), MemberRole::Plain);
        // unknown suffixes are opaque payload
        assert_eq!(MemberRole::classify("a/b.log2"), MemberRole::Plain);
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        assert_eq!(MemberRole::classify("a/b.KEY"), MemberRole::WrappedKey);
        assert_eq!(MemberRole::classify("a/b.Enc"), MemberRole::Ciphertext);
        assert_eq!(MemberRole::classify("a/b.IV"), MemberRole::Nonce);
    }

    #[test]
    fn test_stem_pairs_ciphertext_and_nonce() {
        let ct = ArchiveMember::new("key/debug.txt.enc".to_string());
        let iv = ArchiveMember::new("key/debug.txt.iv".to_string());
        assert_eq!(ct.stem(), iv.stem());
        assert_eq!(ct.stem(), "key/debug.txt");
    }

    #[test]
    fn test_stem_of_plain_member_is_full_name() {
        let plain = ArchiveMember::new("key/debug.txt".to_string());
        assert_eq!(plain.stem(), "key/debug.txt");
    }
}
