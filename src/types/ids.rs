use super::string_newtype;

string_newtype!(
    /// A fully qualified user identifier such as `@alice:example.com`.
    UserId
);

string_newtype!(
    /// Identifier of one device belonging to a user.
    DeviceId
);
