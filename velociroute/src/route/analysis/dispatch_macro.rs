macro_rules! define_describer {
    ($($name: ident => $to: ident, )*) => {
        #[derive(Debug, Copy, Clone)]
        pub(crate) enum DescriberDispatcher {
            $(
                $name($to),
            )*
        }

        impl Describer for DescriberDispatcher {
            fn describe(&self, data: &RouteAnalysisData<'_>) -> Option<String> {
                match self {
                    $(
                        DescriberDispatcher::$name(describer) => describer.describe(data),
                    )*
                }
            }
        }

        impl Describer for Vec<DescriberDispatcher> {
            fn describe(&self, data: &RouteAnalysisData<'_>) -> Option<String> {
                let descriptions = self
                    .iter()
                    .filter_map(|describer| describer.describe(data))
                    .map(|part| part.trim().to_string())
                    .filter(|part| !part.is_empty())
                    .collect::<Vec<_>>();

                if descriptions.is_empty() {
                    None
                } else {
                    Some(descriptions.join(" "))
                }
            }
        }

        impl DescriberDispatcher {
            pub fn all() -> Vec<Self> {
                vec![
                    $(
                        Self::$name($to),
                    )*
                ]
            }
        }
    };
}
